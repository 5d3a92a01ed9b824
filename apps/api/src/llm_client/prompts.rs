// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it.

/// Instruction against inventing data the source text does not contain.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Extract only what the text states. Do NOT infer, interpolate, or invent details. \
    Use an empty string or empty list for anything the text does not mention.";

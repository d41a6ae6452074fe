// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Default system prompt for every completion call.
pub const ASSISTANT_SYSTEM: &str = "You are a helpful assistant.";

/// Instruction appended to prompts whose reply is parsed as JSON.
pub const JSON_OBJECT_INSTRUCTION: &str = "\
    Respond with a single JSON object. \
    Do NOT wrap it in markdown code fences.";

//! Deterministic prompt construction for tone analysis.

const ANALYSIS_TEMPLATE: &str = "\
Analyze this text's communication dynamics and emotional subtext:

1. Overall Tone & Atmosphere:
   - Primary emotional undertone
   - Communication style (formal/casual/etc.)
   - Hidden implications or subtext

2. Key Dynamics:
   - Power dynamics or relationships
   - Emotional states of participants
   - Unspoken intentions or needs

3. Notable Patterns:
   - Communication effectiveness
   - Potential misunderstandings
   - Suggestions for clarity (if needed)

Keep the analysis concise but insightful.";

/// Fixed analysis template with optional context and question sections
/// appended, then the text under analysis. Pure concatenation; same inputs
/// always yield the same prompt.
pub fn build_prompt(text: &str, context: Option<&str>, questions: Option<&str>) -> String {
    let mut prompt = String::from(ANALYSIS_TEMPLATE);
    if let Some(context) = context {
        prompt.push_str("\n\nContext for this interaction: ");
        prompt.push_str(context);
    }
    if let Some(questions) = questions {
        prompt.push_str("\n\nSpecific areas to address: ");
        prompt.push_str(questions);
    }
    prompt.push_str("\n\nText to analyze: ");
    prompt.push_str(text);
    prompt
}

//! Chat service: the Finance Guru consultant persona.
//!
//! One completion call per message. The conversation history travels with
//! every request; nothing is persisted server-side.

use crate::error::AppError;
use crate::models::chat::ChatTurn;
use crate::services::gemini::{Content, GeminiClient, GenerationConfig};

const CHAT_MODEL: &str = "gemini-2.5-flash";

/// Replies are capped so chat answers stay conversational.
const MAX_REPLY_TOKENS: u32 = 500;

const CHAT_SYSTEM_INSTRUCTION: &str = "\
You are a PROFESSIONAL FINANCIAL ANALYST and consultant for Finance Guru, a premier financial advisory firm.

your name is Finance Guru.

DOMAIN RESTRICTION - You ONLY discuss:
- Financial analysis, reporting, budgeting
- Business finance, cash flow, P&L, balance sheets
- Investment analysis, tax planning, forecasting
- Risk assessment, accounting practices

If the user asks about anything else (coding, politics, general knowledge, etc.), politely decline: \"I specialize in financial analysis. How can I help with your finance needs today?\"

TONE & STYLE:
- Professional, objective, and precise.
- Use financial terminology correctly (EBITDA, ROI, Liquidity, etc.).
- Be concise but thorough.
- Suggest uploading files (Excel, CSV, PDF) if the user mentions data.

IMPORTANT:
- If the user greets you, welcome them to Finance Guru.
- If they ask who you are, say you are the Finance Guru AI Analyst.
- Remember: You represent Finance Guru's expertise. Maintain credibility by staying strictly within your financial expertise domain.";

/// Send one chat message with its history and return the reply text.
///
/// # Errors
///
/// `AiUpstream` if the completion call fails; the handler converts it into
/// a friendly message rather than retrying.
pub async fn reply(
    gemini: &GeminiClient,
    history: &[ChatTurn],
    message: &str,
) -> Result<String, AppError> {
    let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
    contents.push(Content::with_role("user", message));

    let config = GenerationConfig {
        max_output_tokens: Some(MAX_REPLY_TOKENS),
        ..Default::default()
    };
    let system = Content::text(CHAT_SYSTEM_INSTRUCTION);

    gemini
        .generate(CHAT_MODEL, &contents, Some(&system), Some(&config))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatRole;

    #[test]
    fn history_converts_to_role_tagged_contents() {
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                content: "What is EBITDA?".to_string(),
            },
            ChatTurn {
                role: ChatRole::Model,
                content: "Earnings before interest, taxes...".to_string(),
            },
        ];

        let contents: Vec<Content> = history.iter().map(Content::from).collect();
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[0].parts[0].text, "What is EBITDA?");
    }
}

//! Plain and schema-constrained completions against the OpenAI API.
//!
//! Reads `OPENAI_API_KEY` (and optionally `OPENAI_API_BASE`,
//! `ORACLE_REQUEST_TIMEOUT_SECS`) from the environment.
//!
//! ```text
//! cargo run --example structured
//! ```

use oracle::prelude::*;
use oracle::schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(crate = "oracle::schemars")]
struct FactCheck {
    /// Whether the claim is true
    holds: bool,
    /// Confidence between 0 and 1
    confidence: f32,
    /// One-sentence justification
    reason: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    let executor = oracle::openai_executor(&settings)?;

    let conversation = Conversation::new(
        vec![
            Message::system("You check facts. Be concise."),
            Message::user("The Great Wall of China is visible from the Moon with the naked eye."),
        ],
        ChatConfig::new("gpt-4o-mini")
            .with_temperature(0.0)
            .with_max_tokens(200)
            .with_seed(7),
    );

    println!("=== Unconstrained completion ===");
    match executor.execute(&conversation, None).await? {
        CompletionResult::Completion(response) => {
            println!("Tokens used: {}", response.usage.total_tokens);
            println!("Response: {}", response.choices[0].message.text());
        }
        CompletionResult::Structured(_) => unreachable!("no schema was supplied"),
    }

    println!("\n=== Schema-constrained completion ===");
    let check: FactCheck = executor.execute_structured(&conversation).await?;
    println!("{:#?}", check);

    Ok(())
}

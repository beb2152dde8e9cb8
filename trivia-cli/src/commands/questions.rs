use anyhow::Result;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use trivia_questions::{Difficulty, GeneratedQuestion, QuestionGenerator};

#[derive(Subcommand)]
pub enum QuestionCommands {
    /// Generate multiple-choice questions for a category
    Generate {
        /// Question category, e.g. "Kenyan history"
        category: String,
        /// easy, medium or hard
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions to ask for
        #[arg(short, long, default_value = "10")]
        count: usize,
        /// Model name on DeepInfra
        #[arg(long)]
        model: Option<String>,
        /// DeepInfra API key
        #[arg(long, env = "TRIVIA_DEEPINFRA_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_question_command(cmd: QuestionCommands) -> Result<()> {
    match cmd {
        QuestionCommands::Generate {
            category,
            difficulty,
            count,
            model,
            api_key,
            json,
        } => {
            let mut generator = QuestionGenerator::new(api_key)?;
            if let Some(model) = model {
                generator = generator.with_model(model);
            }

            let questions = if count == 1 {
                vec![generator.generate_question(&category, difficulty).await?]
            } else {
                generator
                    .generate_questions(&category, difficulty, count)
                    .await?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&questions)?);
            } else {
                print_questions(&questions);
            }

            if questions.len() < count {
                println!(
                    "⚠️  Only {} of {} questions could be parsed",
                    questions.len(),
                    count
                );
            }
        }
    }

    Ok(())
}

fn print_questions(questions: &[GeneratedQuestion]) {
    if questions.is_empty() {
        println!("No questions generated");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Question", "Options", "Answer"]);

    for (i, q) in questions.iter().enumerate() {
        let options = q
            .options
            .iter()
            .zip(['A', 'B', 'C', 'D'])
            .map(|(opt, letter)| format!("{}) {}", letter, opt))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            (i + 1).to_string(),
            q.question.clone(),
            options,
            q.correct_letter().to_string(),
        ]);
    }

    println!("{table}");
}

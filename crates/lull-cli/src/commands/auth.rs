use clap::Subcommand;
use lull_core::integrations::llm;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the classifier API key in the system keyring
    Login {
        /// API key for the classification service
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove the stored API key
    Logout,
    /// Check credential status
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { token } => {
            let tok = token.ok_or("--token required")?;
            llm::store_api_key(&tok)?;
            println!("classifier credentials stored");
        }
        AuthAction::Logout => {
            llm::clear_api_key()?;
            println!("classifier credentials removed");
        }
        AuthAction::Status => {
            let from_env = std::env::var(llm::API_KEY_ENV)
                .map(|v| !v.is_empty())
                .unwrap_or(false);
            if from_env {
                println!("authenticated (environment)");
            } else if llm::keyring_has_api_key() {
                println!("authenticated (keyring)");
            } else {
                println!("not authenticated");
            }
        }
    }
    Ok(())
}

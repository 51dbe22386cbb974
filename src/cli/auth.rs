use std::io::{self, Write};

use anyhow::{Result, anyhow};

use crate::core::config::AppConfig;
use crate::google::oauth::{StoredToken, authorization_url, exchange_code_for_token, save_token};

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let redirect_uri = std::env::var("MAILPILOT_GMAIL_REDIRECT_URI")
        .unwrap_or_else(|_| "urn:ietf:wg:oauth:2.0:oob".to_string());

    print!("Enter the email address you are authenticating: ");
    io::stdout().flush()?;
    let mut user_email = String::new();
    io::stdin().read_line(&mut user_email)?;
    let user_email = user_email.trim().to_owned();

    let auth_url = authorization_url(&config.gmail_api_client_id, &redirect_uri);
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        auth_url
    );

    print!("Paste the authorization code shown by Google here: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().read_line(&mut code)?;
    let code = code.trim();

    let token = exchange_code_for_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        code,
        &redirect_uri,
    )
    .await?;
    let refresh_token = token
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;

    save_token(
        &config.token_path,
        &StoredToken {
            user_email: user_email.clone(),
            refresh_token,
        },
    )?;
    println!(
        "Refresh token for {} saved to {}.",
        user_email,
        config.token_path.display()
    );

    Ok(())
}

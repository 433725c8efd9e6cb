use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use signon::bootstrap::bootstrap;
use signon::config::Config;
use signon::controller::SessionController;
use signon::memory::MemoryProvider;
use signon::provider::{IdentityProvider, LoginRequest, RegisterRequest};
use signon::ui::{ConsoleUi, LoggingNavigator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "signon",
        "signon starting: RUST_LOG='{}', op_timeout={:?}, entry_scene={}, home_scene={}",
        rust_log, config.op_timeout, config.entry_scene, config.home_scene
    );

    let provider = Arc::new(MemoryProvider::new());
    // One verified account to log into out of the box.
    provider.seed("demo", "demo@example.com", "demo-pass", true)?;

    let ui = Arc::new(ConsoleUi);
    let nav = Arc::new(LoggingNavigator);
    let controller = Arc::new(SessionController::new(
        provider.clone() as Arc<dyn IdentityProvider>,
        ui,
        nav,
        config,
    ));

    if let Err(err) = bootstrap(provider.clone(), controller.clone()).await {
        // Prerequisite failure: stay up but present nothing.
        error!(target: "signon", "bootstrap failed, auth disabled: {err:#}");
        return Ok(());
    }

    println!("commands: login <email> <password> | register <user> <email> <pass> <confirm> | verify <email> | resume | signout | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["login", email, password] => {
                let req = LoginRequest { email: email.to_string(), password: password.to_string() };
                let _ = controller.login(&req).await;
            }
            ["register", username, email, password, confirm] => {
                let req = RegisterRequest {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm_password: confirm.to_string(),
                };
                let _ = controller.register(&req).await;
            }
            ["verify", email] => {
                if provider.mark_verified(email) {
                    println!("-- {email} marked verified, run `resume` or log in again");
                } else {
                    println!("-- no account for {email}");
                }
            }
            ["resume"] => {
                let _ = controller.resume().await;
            }
            ["signout"] => controller.sign_out(),
            ["quit"] | ["exit"] => break,
            [] => {}
            other => println!("-- unrecognized command: {other:?}"),
        }
        println!("-- phase: {:?}", controller.phase());
    }
    Ok(())
}

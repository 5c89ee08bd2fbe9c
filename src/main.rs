//! session-ctx binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_ctx::auth::{self, HttpAuthApi};
use session_ctx::cli::{self, Args, Command};
use session_ctx::config::Config;
use session_ctx::{
    logging, AuthState, FileStore, LoginRequest, RegisterForm, SessionContext, SessionCtxError,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'session-ctx --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> session_ctx::Result<()> {
    let config = Config::load(&args)?;
    logging::init_with_filter(config.log_filter()).ok();

    debug!("session-ctx v{}", env!("CARGO_PKG_VERSION"));
    info!(path = %config.storage.path.display(), "opening session storage");

    let store = Arc::new(FileStore::new(&config.storage.path));
    let ctx = SessionContext::mount_with(store, session_ctx::SESSION_KEY, config.write_policy());
    let snapshot = ctx.loaded().await;
    if snapshot.storage_unavailable {
        eprintln!("warning: stored session could not be read, treating as signed out");
    }

    match args.command {
        Command::Status => print_status(&ctx),
        Command::Logout => {
            if ctx.sign_out() {
                println!("signed out");
            } else {
                println!("not signed in");
            }
        }
        Command::Login { email, password } => {
            let api = HttpAuthApi::new(&config.auth.api_url, config.auth_timeout())?;
            let request = LoginRequest::new(email, password);
            if auth::sign_in_with(&api, &ctx, &request).await? {
                println!("signed in as {}", request.email);
            } else {
                println!("already signed in; run 'session-ctx logout' first");
            }
        }
        Command::Register {
            email,
            password,
            confirm_password,
            accept_terms,
        } => {
            let api = HttpAuthApi::new(&config.auth.api_url, config.auth_timeout())?;
            let form = RegisterForm {
                email,
                password,
                confirm_password,
                accepts_terms: accept_terms,
            };
            auth::register_with(&api, &form).await?;
            println!("registration successful, you can now log in");
        }
    }

    ctx.flush().await;
    if ctx.failed_writes() > 0 {
        return Err(SessionCtxError::Storage(
            "session could not be saved to local storage".into(),
        ));
    }
    Ok(())
}

fn print_status(ctx: &SessionContext) {
    let snapshot = ctx.snapshot();
    match (snapshot.auth_state(), snapshot.session) {
        (AuthState::Authenticated, Some(session)) => {
            println!("signed in");
            println!("{}", session);
        }
        (AuthState::Unknown, _) => println!("loading"),
        _ => println!("signed out"),
    }
}

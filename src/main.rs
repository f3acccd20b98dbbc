use std::{process, sync::Arc};

use blogengine::{
    application::{
        authors::AuthorKeyService,
        error::AppError,
        posts::PostService,
        repos::{AuthorKeysRepo, DatabaseHealth, PostsRepo, PostsWriteRepo, TagsRepo, TagsWriteRepo},
        tags::TagService,
    },
    config::{self, KeysCommand},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Keys(args) => run_keys(settings, args.command).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::bind(settings.server.addr, err)))?;
    info!(
        target = "blogengine::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::from(InfraError::Serve(err)))?;

    info!(target = "blogengine::serve", "server stopped");
    Ok(())
}

async fn run_keys(settings: config::Settings, command: KeysCommand) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let keys_repo: Arc<dyn AuthorKeysRepo> = repositories;
    let service = AuthorKeyService::new(keys_repo);

    match command {
        KeysCommand::Issue(args) => {
            let issued = service
                .issue(&args.name)
                .await
                .map_err(|err| AppError::validation(err.to_string()))?;
            println!("prefix: {}", issued.record.prefix);
            println!("token:  {}", issued.token);
            println!("Store the token now; it cannot be shown again.");
        }
        KeysCommand::Revoke(args) => {
            service
                .revoke(&args.prefix)
                .await
                .map_err(|err| AppError::validation(err.to_string()))?;
            println!("revoked {}", args.prefix);
        }
    }
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let tags_write_repo: Arc<dyn TagsWriteRepo> = repositories.clone();
    let keys_repo: Arc<dyn AuthorKeysRepo> = repositories.clone();
    let health: Arc<dyn DatabaseHealth> = repositories;

    let posts = PostService::new(
        posts_repo.clone(),
        posts_write_repo,
        tags_repo.clone(),
        settings.blog.posts_per_page,
    );
    let tags = TagService::new(tags_repo, tags_write_repo, posts_repo);

    HttpState {
        posts: Arc::new(posts),
        tags: Arc::new(tags),
        authors: Arc::new(AuthorKeyService::new(keys_repo)),
        health,
        site_title: Arc::from(settings.blog.title.as_str()),
        secure_cookies: settings.server.secure_cookies,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "blogengine::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "blogengine::serve", "shutdown requested");
}

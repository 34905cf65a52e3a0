use std::{process, sync::Arc};

use popit::{
    application::{
        embed::EmbedService,
        error::AppError,
        posts::PostService,
        preferences::PreferenceService,
        repos::{
            AuthorsRepo, ExternalMetaRepo, PostMetaRepo, PostsRepo, SitePreferencesRepo,
            StoreHealth, TermsRepo,
        },
        social::{ShareCountRefresher, SocialOptions},
        spotlight::SpotlightService,
    },
    config,
    infra::{
        db::MySqlRepositories,
        error::InfraError,
        http::{self, ApiState},
        remote::RemoteClient,
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
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::RefreshSocial(_) => run_refresh_social(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    let social_handle = if settings.social.enabled {
        info!(
            target = "popit::social",
            site_host = %settings.social.site_host,
            "Starting share count refresher"
        );
        Some(tokio::spawn(app.refresher.clone().run()))
    } else {
        None
    };

    let result = serve_http(&settings, app.api_state).await;

    if let Some(handle) = social_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_refresh_social(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings)?;

    info!(
        target = "popit::social",
        site_host = %settings.social.site_host,
        "Starting one-off share count refresh"
    );
    let summary = app.refresher.refresh_all().await?;
    info!(
        target = "popit::social",
        updated = summary.updated,
        zero = summary.zero,
        failed = summary.failed,
        "Share count refresh completed"
    );
    Ok(())
}

struct ApplicationContext {
    api_state: ApiState,
    refresher: Arc<ShareCountRefresher>,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<MySqlRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = MySqlRepositories::connect(database_url, &settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(MySqlRepositories::new(
        pool,
        &settings.database.table_prefix,
    )))
}

fn build_application_context(
    repositories: Arc<MySqlRepositories>,
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let terms_repo: Arc<dyn TermsRepo> = repositories.clone();
    let authors_repo: Arc<dyn AuthorsRepo> = repositories.clone();
    let meta_repo: Arc<dyn PostMetaRepo> = repositories.clone();
    let external_meta_repo: Arc<dyn ExternalMetaRepo> = repositories.clone();
    let preferences_repo: Arc<dyn SitePreferencesRepo> = repositories.clone();
    let store: Arc<dyn StoreHealth> = repositories;

    let user_agent = settings
        .remote
        .user_agent
        .as_deref()
        .unwrap_or(RemoteClient::default_user_agent());
    let remote = RemoteClient::new(settings.remote.timeout, user_agent)
        .map_err(|err| AppError::from(InfraError::http_client(err.to_string())))?;

    let post_service = PostService::new(
        posts_repo.clone(),
        terms_repo.clone(),
        authors_repo.clone(),
        meta_repo,
        external_meta_repo.clone(),
        settings.excerpt.max_chars.get() as usize,
    );
    let spotlight_service = Arc::new(SpotlightService::new(
        post_service.clone(),
        terms_repo,
        authors_repo,
        settings.spotlight.clone(),
    ));
    let embed_service = EmbedService::new(remote.clone(), settings.embed.oembed_url.clone());
    let refresher = Arc::new(ShareCountRefresher::new(
        posts_repo,
        external_meta_repo,
        remote,
        SocialOptions {
            graph_url: settings.social.graph_url.clone(),
            site_host: settings.social.site_host.clone(),
            post_delay: settings.social.post_delay,
            cycle_interval: settings.social.cycle_interval,
        },
    ));

    let api_state = ApiState {
        posts: post_service,
        spotlight: spotlight_service,
        preferences: PreferenceService::new(preferences_repo),
        embed: embed_service,
        listing: settings.listing.clone(),
        store,
    };

    Ok(ApplicationContext {
        api_state,
        refresher,
    })
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "popit::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

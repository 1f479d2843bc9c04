use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Duration;

use agora_core::session::DEFAULT_SESSION_DAYS;
use agora_core::tokens::DEFAULT_TOKEN_TTL_MINUTES;
use agora_core::{
    Accounts, AuthGate, Content, GenericStore, JwtSessions, ModerationGate, Reactions,
    SessionCodec, SocialGraph, TokenManager, UserStore, ViewTracker, WordListFilter,
};
use agora_types::api::{LoginRequest, RegisterRequest, SessionResponse, UserSummary};

use crate::blocking;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::mail::{LogMailer, Mailer};

pub type AppState = Arc<AppStateInner>;

/// Settings the HTTP layer needs to wire the core services.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub session_days: i64,
    pub token_ttl_minutes: i64,
    /// Base of the links put in verification and reset mail.
    pub public_url: String,
    /// Extra words added to the profanity list.
    pub blocked_words: Vec<String>,
}

impl ApiConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_days: DEFAULT_SESSION_DAYS,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            public_url: "http://localhost:3005".into(),
            blocked_words: Vec::new(),
        }
    }
}

pub struct AppStateInner {
    pub accounts: Accounts,
    pub gate: AuthGate,
    pub graph: SocialGraph,
    pub views: ViewTracker,
    pub content: Content,
    pub reactions: Reactions,
    pub mailer: Arc<dyn Mailer>,
    pub public_url: String,
}

impl AppStateInner {
    pub fn new(
        users: Arc<dyn UserStore>,
        generics: Arc<dyn GenericStore>,
        config: ApiConfig,
    ) -> Self {
        let sessions: Arc<dyn SessionCodec> = Arc::new(
            JwtSessions::new(config.jwt_secret.as_bytes())
                .with_validity(Duration::days(config.session_days)),
        );
        let tokens = TokenManager::new(users.clone())
            .with_ttl(Duration::minutes(config.token_ttl_minutes));
        let filter = WordListFilter::new().with_words(&config.blocked_words);
        let moderation = ModerationGate::new(users.clone(), Arc::new(filter));

        Self {
            accounts: Accounts::new(users.clone(), sessions.clone(), tokens),
            gate: AuthGate::new(users.clone(), sessions),
            graph: SocialGraph::new(users.clone()),
            views: ViewTracker::new(users, generics.clone()),
            content: Content::new(generics.clone(), moderation),
            reactions: Reactions::new(generics),
            mailer: Arc::new(LogMailer),
            public_url: config.public_url,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = blocking(move || {
        state
            .accounts
            .register(&req.handle, &req.email, &req.password)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: UserSummary::from(&session.user),
            token: session.token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = blocking(move || state.accounts.login(&req.email, &req.password)).await?;

    Ok(Json(SessionResponse {
        user: UserSummary::from(&session.user),
        token: session.token,
    }))
}

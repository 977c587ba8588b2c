use super::require_session;
use crate::domain::{Like, LikeViewState, Session};
use crate::infrastructure::session::SessionStore;
use codequest_errors::AppError;
use std::sync::Arc;
use tokio::sync::watch;

/// Backend operations the like widget needs.
#[async_trait::async_trait]
pub trait LikeApi: Send + Sync {
    async fn create_like(&self, post_id: &str) -> Result<Like, AppError>;
    async fn delete_like(&self, like_id: &str) -> Result<(), AppError>;
    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server confirmed the toggle; carries the settled view.
    Applied(LikeViewState),
    /// Another toggle was still in flight, nothing happened.
    Ignored,
}

/// `{success, error}` summary of a toggle for callers that only display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleReport {
    pub success: bool,
    pub error: Option<String>,
}

impl From<&Result<ToggleOutcome, AppError>> for ToggleReport {
    fn from(result: &Result<ToggleOutcome, AppError>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.user_message().to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    /// Liked exactly when the server-side like id is known.
    Idle { like_id: Option<String> },
    /// Optimistic view shown; the pre-toggle values are kept for rollback.
    Pending {
        target: bool,
        prior_count: i64,
        prior_like_id: Option<String>,
    },
}

enum Request {
    Create,
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LikeState {
    count: i64,
    phase: Phase,
    /// Bumped on every phase change; a lookup started before a bump is stale.
    generation: u64,
}

impl LikeState {
    fn view(&self) -> LikeViewState {
        match &self.phase {
            Phase::Idle { like_id } => LikeViewState {
                liked: like_id.is_some(),
                like_count: self.count,
                like_id: like_id.clone(),
                pending: false,
            },
            Phase::Pending {
                target,
                prior_like_id,
                ..
            } => LikeViewState {
                liked: *target,
                like_count: self.count,
                like_id: prior_like_id.clone(),
                pending: true,
            },
        }
    }

    /// Idle → Pending. `None` while a toggle is already in flight.
    fn begin(&mut self) -> Option<Request> {
        let Phase::Idle { like_id } = &self.phase else {
            return None;
        };

        let prior_like_id = like_id.clone();
        let prior_count = self.count;
        let (target, request) = match &prior_like_id {
            None => (true, Request::Create),
            Some(id) => (false, Request::Delete(id.clone())),
        };

        self.count = if target { prior_count + 1 } else { prior_count - 1 };
        self.phase = Phase::Pending {
            target,
            prior_count,
            prior_like_id,
        };
        self.generation += 1;
        Some(request)
    }

    /// Pending → Idle with the server's answer; the optimistic count stays.
    fn settle(&mut self, like_id: Option<String>) {
        if matches!(self.phase, Phase::Pending { .. }) {
            self.phase = Phase::Idle { like_id };
            self.generation += 1;
        }
    }

    /// Pending → Idle with every pre-toggle value restored.
    fn roll_back(&mut self) {
        if let Phase::Pending {
            prior_count,
            prior_like_id,
            ..
        } = &self.phase
        {
            self.count = *prior_count;
            self.phase = Phase::Idle {
                like_id: prior_like_id.clone(),
            };
            self.generation += 1;
        }
    }

    /// Adopts the server's like record as read at `generation`. Ignored
    /// while a toggle is in flight or once one has started since the read.
    fn seed(&mut self, like_id: Option<String>, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        match &self.phase {
            Phase::Idle { like_id: current } if *current != like_id => {
                self.phase = Phase::Idle { like_id };
                self.generation += 1;
                true
            }
            _ => false,
        }
    }
}

/// Receives every change of a widget's view.
pub struct LikeWatch {
    rx: watch::Receiver<LikeState>,
}

impl LikeWatch {
    pub fn current(&self) -> LikeViewState {
        self.rx.borrow().view()
    }

    /// Waits for the next change. Fails once the widget is gone.
    pub async fn changed(&mut self) -> Result<LikeViewState, AppError> {
        self.rx
            .changed()
            .await
            .map_err(|_| AppError::Cancelled)?;
        Ok(self.rx.borrow_and_update().view())
    }
}

/// Like button state for one post: optimistic toggles against the backend,
/// rolled back when the backend refuses.
pub struct LikeToggle {
    api: Arc<dyn LikeApi>,
    session: SessionStore,
    post_id: Option<String>,
    state: watch::Sender<LikeState>,
    detached: watch::Sender<bool>,
}

impl LikeToggle {
    pub fn new(
        api: Arc<dyn LikeApi>,
        session: SessionStore,
        post_id: Option<String>,
        initial_count: i64,
    ) -> Self {
        let (state, _) = watch::channel(LikeState {
            count: initial_count,
            phase: Phase::Idle { like_id: None },
            generation: 0,
        });
        let (detached, _) = watch::channel(false);

        Self {
            api,
            session,
            post_id: post_id.filter(|id| !id.is_empty()),
            state,
            detached,
        }
    }

    pub fn view(&self) -> LikeViewState {
        self.state.borrow().view()
    }

    pub fn subscribe(&self) -> LikeWatch {
        LikeWatch {
            rx: self.state.subscribe(),
        }
    }

    /// Seeds `liked`/`like_id` from the backend. Without a session or post
    /// id there is nothing to ask and the view keeps its defaults.
    pub async fn reconcile(&self) -> Result<(), AppError> {
        if self.is_detached() {
            return Ok(());
        }
        let Some((post_id, session)) = self.credentials() else {
            return Ok(());
        };

        let generation = self.state.borrow().generation;
        let found = self
            .api
            .find_like(&post_id, &session.id)
            .await
            .inspect_err(|e| tracing::error!("Error checking like status: {}", e))?;

        let seeded = self
            .state
            .send_if_modified(|state| state.seed(found.map(|like| like.id), generation));
        if !seeded {
            tracing::debug!("Like status of post {} unchanged or superseded", post_id);
        }
        Ok(())
    }

    /// Flips the like. The view changes before the request goes out and is
    /// restored exactly if the request fails.
    pub async fn toggle(&self) -> Result<ToggleOutcome, AppError> {
        if self.is_detached() {
            return Err(AppError::Cancelled);
        }
        let (post_id, session) = self.credentials().ok_or(AppError::Unauthenticated)?;

        let mut request = None;
        self.state.send_if_modified(|state| {
            request = state.begin();
            request.is_some()
        });
        let Some(request) = request else {
            tracing::debug!("Like toggle for post {} ignored, request in flight", post_id);
            return Ok(ToggleOutcome::Ignored);
        };

        let pending = PendingToggle {
            state: &self.state,
            armed: true,
        };

        let result = tokio::select! {
            result = self.dispatch(&post_id, &session, request) => result,
            _ = detached(self.detached.subscribe()) => Err(AppError::Cancelled),
        };

        match result {
            Ok(like_id) => {
                pending.settle(like_id);
                Ok(ToggleOutcome::Applied(self.view()))
            }
            Err(e) => {
                tracing::warn!("Error toggling like on post {}: {}", post_id, e);
                pending.roll_back();
                Err(e)
            }
        }
    }

    /// Unmount: aborts the in-flight toggle (which rolls back) and refuses
    /// further ones.
    pub fn detach(&self) {
        self.detached.send_replace(true);
    }

    pub fn is_detached(&self) -> bool {
        *self.detached.borrow()
    }

    fn credentials(&self) -> Option<(String, Session)> {
        let post_id = self.post_id.clone()?;
        let session = require_session(&self.session).ok()?;
        Some((post_id, session))
    }

    /// Returns the like id the server now holds for this user and post.
    async fn dispatch(
        &self,
        post_id: &str,
        session: &Session,
        request: Request,
    ) -> Result<Option<String>, AppError> {
        match request {
            Request::Create => match self.api.create_like(post_id).await {
                Ok(like) => Ok(Some(like.id)),
                Err(e) if e.is_conflict() => {
                    // Already liked server-side: adopt the existing record.
                    let existing = self.api.find_like(post_id, &session.id).await?;
                    existing.map(|like| Some(like.id)).ok_or(e)
                }
                Err(e) => Err(e),
            },
            Request::Delete(like_id) => match self.api.delete_like(&like_id).await {
                Ok(()) => Ok(None),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Like {} was already gone", like_id);
                    Ok(None)
                }
                Err(e) => Err(e),
            },
        }
    }
}

/// Resolves once the widget is detached.
async fn detached(mut rx: watch::Receiver<bool>) {
    rx.wait_for(|gone| *gone).await.ok();
}

/// The in-flight half of a toggle. Rolls the view back if the toggle
/// future is dropped before the request resolves.
struct PendingToggle<'a> {
    state: &'a watch::Sender<LikeState>,
    armed: bool,
}

impl PendingToggle<'_> {
    fn settle(mut self, like_id: Option<String>) {
        self.armed = false;
        self.state.send_modify(|state| state.settle(like_id));
    }

    fn roll_back(mut self) {
        self.armed = false;
        self.state.send_modify(LikeState::roll_back);
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Like toggle dropped in flight, rolling back");
            self.state.send_modify(LikeState::roll_back);
        }
    }
}

impl Drop for LikeToggle {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        creates: Mutex<VecDeque<Result<Like, AppError>>>,
        deletes: Mutex<VecDeque<Result<(), AppError>>>,
        lookups: Mutex<VecDeque<Result<Option<Like>, AppError>>>,
        gate: Option<Arc<Notify>>,
        lookup_gate: Option<Arc<Notify>>,
    }

    impl FakeApi {
        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        fn gated_lookup(gate: Arc<Notify>) -> Self {
            Self {
                lookup_gate: Some(gate),
                ..Self::default()
            }
        }

        fn on_create(&self, result: Result<Like, AppError>) {
            self.creates.lock().unwrap().push_back(result);
        }

        fn on_delete(&self, result: Result<(), AppError>) {
            self.deletes.lock().unwrap().push_back(result);
        }

        fn on_lookup(&self, result: Result<Option<Like>, AppError>) {
            self.lookups.lock().unwrap().push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn pass_gate(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait::async_trait]
    impl LikeApi for FakeApi {
        async fn create_like(&self, post_id: &str) -> Result<Like, AppError> {
            self.pass_gate().await;
            let next = self.creates.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(like("generated", post_id)))
        }

        async fn delete_like(&self, _like_id: &str) -> Result<(), AppError> {
            self.pass_gate().await;
            let next = self.deletes.lock().unwrap().pop_front();
            next.unwrap_or(Ok(()))
        }

        async fn find_like(&self, _post_id: &str, _user_id: &str) -> Result<Option<Like>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.lookup_gate {
                gate.notified().await;
            }
            let next = self.lookups.lock().unwrap().pop_front();
            next.unwrap_or(Ok(None))
        }
    }

    fn like(id: &str, post_id: &str) -> Like {
        Like {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            post_id: Some(post_id.to_string()),
            created_at: None,
        }
    }

    fn server_error() -> AppError {
        AppError::ServerRejected {
            status: 500,
            message: "Internal Server Error".to_string(),
        }
    }

    fn signed_in() -> SessionStore {
        let store = SessionStore::in_memory();
        store
            .set(&Session {
                id: "u1".to_string(),
                username: "devi".to_string(),
                role: Role::User,
                token: "token".to_string(),
                email: None,
                avatar: None,
            })
            .unwrap();
        store
    }

    fn widget(api: &Arc<FakeApi>, count: i64) -> LikeToggle {
        LikeToggle::new(api.clone(), signed_in(), Some("p1".to_string()), count)
    }

    async fn wait_until_pending(toggle: &LikeToggle) {
        while !toggle.view().pending {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_like_then_unlike_converges() {
        let api = Arc::new(FakeApi::default());
        api.on_create(Ok(like("l1", "p1")));
        let toggle = widget(&api, 5);

        let outcome = toggle.toggle().await.unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Applied(LikeViewState {
                liked: true,
                like_count: 6,
                like_id: Some("l1".to_string()),
                pending: false,
            })
        );

        toggle.toggle().await.unwrap();
        assert_eq!(
            toggle.view(),
            LikeViewState {
                liked: false,
                like_count: 5,
                like_id: None,
                pending: false,
            }
        );
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_serial_toggles_match_confirmed_sequence() {
        let api = Arc::new(FakeApi::default());
        let toggle = widget(&api, 10);

        for n in 1..=7 {
            toggle.toggle().await.unwrap();
            let view = toggle.view();
            assert_eq!(view.liked, n % 2 == 1);
            assert_eq!(view.like_count, if n % 2 == 1 { 11 } else { 10 });
            assert_eq!(view.like_id.is_some(), view.liked);
        }
        assert_eq!(api.calls(), 7);
    }

    #[tokio::test]
    async fn test_failed_like_rolls_back() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated(gate.clone()));
        api.on_create(Err(server_error()));
        let toggle = Arc::new(widget(&api, 5));
        let before = toggle.view();

        let task = tokio::spawn({
            let toggle = toggle.clone();
            async move { toggle.toggle().await }
        });
        wait_until_pending(&toggle).await;

        let optimistic = toggle.view();
        assert!(optimistic.liked);
        assert_eq!(optimistic.like_count, 6);

        gate.notify_one();
        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, server_error());
        assert_eq!(toggle.view(), before);
        assert_eq!(toggle.view().like_count, 5);
        assert!(!toggle.view().liked);
    }

    #[tokio::test]
    async fn test_failed_unlike_restores_like_id() {
        let api = Arc::new(FakeApi::default());
        api.on_create(Ok(like("l9", "p1")));
        api.on_delete(Err(AppError::NetworkFailure("reset".to_string())));
        let toggle = widget(&api, 0);

        toggle.toggle().await.unwrap();
        let liked = toggle.view();

        assert!(toggle.toggle().await.is_err());
        assert_eq!(toggle.view(), liked);
        assert_eq!(toggle.view().like_id.as_deref(), Some("l9"));
    }

    #[tokio::test]
    async fn test_toggle_while_pending_is_ignored() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated(gate.clone()));
        let toggle = Arc::new(widget(&api, 1));

        let task = tokio::spawn({
            let toggle = toggle.clone();
            async move { toggle.toggle().await }
        });
        wait_until_pending(&toggle).await;
        let pending = toggle.view();

        assert_eq!(toggle.toggle().await.unwrap(), ToggleOutcome::Ignored);
        assert_eq!(toggle.view(), pending);
        assert_eq!(api.calls(), 1);

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(toggle.view().like_count, 2);
    }

    #[tokio::test]
    async fn test_requires_session_and_post() {
        let api = Arc::new(FakeApi::default());

        let anonymous = LikeToggle::new(api.clone(), SessionStore::in_memory(), Some("p1".into()), 3);
        assert_eq!(anonymous.toggle().await, Err(AppError::Unauthenticated));
        assert_eq!(anonymous.view().like_count, 3);

        let no_post = LikeToggle::new(api.clone(), signed_in(), None, 3);
        assert_eq!(no_post.toggle().await, Err(AppError::Unauthenticated));
        assert!(!no_post.view().liked);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_clamping_below_zero() {
        let api = Arc::new(FakeApi::default());
        api.on_lookup(Ok(Some(like("l1", "p1"))));
        let toggle = widget(&api, 0);

        toggle.reconcile().await.unwrap();
        toggle.toggle().await.unwrap();
        assert_eq!(toggle.view().like_count, -1);
    }

    #[tokio::test]
    async fn test_reconcile_seeds_from_server() {
        let api = Arc::new(FakeApi::default());
        api.on_lookup(Ok(Some(like("l7", "p1"))));
        let toggle = widget(&api, 4);
        let mut watch = toggle.subscribe();

        toggle.reconcile().await.unwrap();
        let seeded = watch.changed().await.unwrap();
        assert!(seeded.liked);
        assert_eq!(seeded.like_id.as_deref(), Some("l7"));
        assert_eq!(seeded.like_count, 4);
        assert_eq!(watch.current(), toggle.view());
    }

    #[tokio::test]
    async fn test_reconcile_answer_older_than_toggle_is_discarded() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated_lookup(gate.clone()));
        api.on_lookup(Ok(None));
        api.on_create(Ok(like("l1", "p1")));
        let toggle = Arc::new(widget(&api, 5));

        let lookup = tokio::spawn({
            let toggle = toggle.clone();
            async move { toggle.reconcile().await }
        });
        while api.calls() == 0 {
            tokio::task::yield_now().await;
        }

        toggle.toggle().await.unwrap();
        let confirmed = toggle.view();
        assert_eq!(confirmed.like_id.as_deref(), Some("l1"));

        gate.notify_one();
        lookup.await.unwrap().unwrap();
        assert_eq!(toggle.view(), confirmed);
        assert!(toggle.view().liked);
        assert_eq!(toggle.view().like_count, 6);
    }

    #[tokio::test]
    async fn test_dropped_toggle_future_rolls_back() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated(gate.clone()));
        let toggle = widget(&api, 5);
        let before = toggle.view();

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(50), toggle.toggle()).await;
        assert!(timed_out.is_err());
        assert_eq!(toggle.view(), before);

        gate.notify_one();
        let outcome = toggle.toggle().await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Applied(view) if view.liked && view.like_count == 6));
    }

    #[tokio::test]
    async fn test_reconcile_without_session_is_silent() {
        let api = Arc::new(FakeApi::default());
        let toggle = LikeToggle::new(api.clone(), SessionStore::in_memory(), Some("p1".into()), 2);

        toggle.reconcile().await.unwrap();
        assert_eq!(api.calls(), 0);
        assert!(!toggle.view().liked);
    }

    #[tokio::test]
    async fn test_conflict_adopts_existing_like() {
        let api = Arc::new(FakeApi::default());
        api.on_create(Err(AppError::ServerRejected {
            status: 409,
            message: "Already liked".to_string(),
        }));
        api.on_lookup(Ok(Some(like("existing", "p1"))));
        let toggle = widget(&api, 2);

        toggle.toggle().await.unwrap();
        let view = toggle.view();
        assert!(view.liked);
        assert_eq!(view.like_id.as_deref(), Some("existing"));
        assert_eq!(view.like_count, 3);
    }

    #[tokio::test]
    async fn test_conflict_without_record_rolls_back() {
        let api = Arc::new(FakeApi::default());
        let conflict = AppError::ServerRejected {
            status: 409,
            message: "Already liked".to_string(),
        };
        api.on_create(Err(conflict.clone()));
        api.on_lookup(Ok(None));
        let toggle = widget(&api, 2);

        assert_eq!(toggle.toggle().await, Err(conflict));
        assert_eq!(toggle.view().like_count, 2);
        assert!(!toggle.view().liked);
    }

    #[tokio::test]
    async fn test_unlike_of_missing_like_settles() {
        let api = Arc::new(FakeApi::default());
        api.on_create(Ok(like("l1", "p1")));
        api.on_delete(Err(AppError::ServerRejected {
            status: 404,
            message: "Not Found".to_string(),
        }));
        let toggle = widget(&api, 1);

        toggle.toggle().await.unwrap();
        toggle.toggle().await.unwrap();
        assert!(!toggle.view().liked);
        assert_eq!(toggle.view().like_count, 1);
    }

    #[tokio::test]
    async fn test_detach_cancels_in_flight_toggle() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated(gate));
        let toggle = Arc::new(widget(&api, 8));
        let before = toggle.view();

        let task = tokio::spawn({
            let toggle = toggle.clone();
            async move { toggle.toggle().await }
        });
        wait_until_pending(&toggle).await;

        toggle.detach();
        assert_eq!(task.await.unwrap(), Err(AppError::Cancelled));
        assert_eq!(toggle.view(), before);

        assert_eq!(toggle.toggle().await, Err(AppError::Cancelled));
        assert_eq!(api.calls(), 1);
    }

    #[test]
    fn test_report_from_result() {
        let ok: Result<ToggleOutcome, AppError> = Ok(ToggleOutcome::Ignored);
        assert_eq!(
            ToggleReport::from(&ok),
            ToggleReport {
                success: true,
                error: None
            }
        );

        let err: Result<ToggleOutcome, AppError> = Err(AppError::Unauthenticated);
        let report = ToggleReport::from(&err);
        assert!(!report.success);
        assert_eq!(
            report.error.as_deref(),
            Some("Debes iniciar sesión para continuar.")
        );
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Application Controller
//!
//! The single-writer update loop. All state (session, active view, alert
//! slot, form drafts) is owned by [`App`] and mutated only inside
//! [`App::update`] / [`App::apply_command`]; remote work runs as spawned
//! effects whose completions come back through the message channel as
//! epoch-tagged [`Msg`] values.
//!
//! ## Staleness
//!
//! Every view transition advances the router epoch. Effects capture the
//! epoch at issue time; a completion whose epoch no longer matches is
//! discarded instead of applied, so a list refresh that resolves after the
//! user logged out cannot repaint a dead screen or resurrect session state.
//! In-flight guards are released even for discarded completions.
//!
//! ## Dispatch
//!
//! User commands are resolved against the binding table of the last
//! rendered tree: a control that is not part of the active view is simply
//! not bound, and the command is rejected with an advisory alert.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::alert::{AlertKind, AlertNotifier, ALERT_TTL};
use crate::cli::Command;
use crate::error::{AppError, RemoteFailure};
use crate::gateway::{CertificateGateway, GatewayError};
use crate::identity::{Identity, IdentityError, IdentityProvider};
use crate::models::{Certificate, CertificateId, RemoteOutcome, VerificationResult};
use crate::render::{render, ControlId, UiTree};
use crate::router::{NavTarget, ViewRouter, ViewState};
use crate::session::Session;
use crate::state::{InFlight, Operation, RegistrationForm, VerifyForm};

/// Messages consumed by the update loop: the startup trigger, completions of
/// spawned effects, and alert expiries.
#[derive(Debug)]
pub enum Msg {
    /// Kick off the session probe. Sent once at startup.
    Initialize,
    /// The identity provider answered the startup probe.
    SessionProbed {
        epoch: u64,
        outcome: Result<Option<Identity>, IdentityError>,
    },
    /// The interactive login flow finished.
    LoginResolved {
        epoch: u64,
        outcome: Result<Identity, IdentityError>,
    },
    /// The backend answered the admin determination.
    AdminCheckResolved {
        epoch: u64,
        outcome: Result<bool, GatewayError>,
    },
    /// The remote session invalidation finished. Local state was already
    /// cleared when logout was requested.
    LogoutResolved { outcome: Result<(), IdentityError> },
    /// Registration round trip finished (file read included).
    RegisterResolved {
        epoch: u64,
        outcome: Result<RemoteOutcome<CertificateId>, AppError>,
    },
    /// Verification round trip finished.
    VerifyResolved {
        epoch: u64,
        outcome: Result<VerificationResult, AppError>,
    },
    /// Listing round trip finished.
    ListResolved {
        epoch: u64,
        outcome: Result<RemoteOutcome<Vec<Certificate>>, AppError>,
    },
    /// Revocation round trip finished.
    RevokeResolved {
        epoch: u64,
        id: CertificateId,
        outcome: Result<RemoteOutcome<CertificateId>, AppError>,
    },
    /// An alert's 5-second window elapsed.
    AlertExpired { generation: u64 },
}

/// Collapse a wire outcome into the success value or the alert-ready error.
fn flatten_wire<T>(outcome: Result<RemoteOutcome<T>, AppError>) -> Result<T, AppError> {
    outcome.and_then(|wire| {
        wire.into_result()
            .map_err(|kind| AppError::Remote(RemoteFailure::Backend(kind)))
    })
}

/// The application controller.
pub struct App<I, G> {
    identity: Arc<I>,
    gateway: Arc<G>,
    tx: UnboundedSender<Msg>,
    session: Session,
    router: ViewRouter,
    alerts: AlertNotifier,
    registration: RegistrationForm,
    verify_form: VerifyForm,
    in_flight: InFlight,
    tree: UiTree,
}

impl<I: IdentityProvider, G: CertificateGateway> App<I, G> {
    pub fn new(identity: Arc<I>, gateway: Arc<G>, tx: UnboundedSender<Msg>) -> Self {
        let session = Session::anonymous();
        let router = ViewRouter::new();
        let registration = RegistrationForm::default();
        let verify_form = VerifyForm::default();
        let tree = render(&session, router.current(), None, &registration, &verify_form);
        Self {
            identity,
            gateway,
            tx,
            session,
            router,
            alerts: AlertNotifier::new(),
            registration,
            verify_form,
            in_flight: InFlight::default(),
            tree,
        }
    }

    /// The last rendered tree (the current binding table).
    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &ViewState {
        self.router.current()
    }

    /// Apply a completion or lifecycle message, then re-render.
    pub fn update(&mut self, msg: Msg) {
        self.apply_msg(msg);
        self.rerender();
    }

    /// Apply a user command, then re-render.
    pub fn apply_command(&mut self, command: Command) {
        self.apply(command);
        self.rerender();
    }

    fn rerender(&mut self) {
        self.tree = render(
            &self.session,
            self.router.current(),
            self.alerts.current(),
            &self.registration,
            &self.verify_form,
        );
    }

    // -------------------------------------------------------------------------
    // Command dispatch
    // -------------------------------------------------------------------------

    fn apply(&mut self, command: Command) {
        match command {
            Command::Login => {
                if self.reject_unbound(&ControlId::LoginButton) {
                    return;
                }
                self.start_login();
            }
            Command::Logout => {
                if self.reject_unbound(&ControlId::LogoutLink) {
                    return;
                }
                self.logout();
            }
            Command::Nav(target) => self.navigate(target),
            Command::Set(field, value) => {
                if self.reject_unbound(&ControlId::Field(field)) {
                    return;
                }
                self.registration.set(field, value);
            }
            Command::Attach(path) => {
                if self.tree.is_bound(&ControlId::RegisterFile) {
                    self.registration.file = Some(path);
                } else if self.tree.is_bound(&ControlId::VerifyFile) {
                    self.verify_form.file = Some(path);
                } else {
                    self.advise_unbound();
                }
            }
            Command::Register => {
                if !self.session.is_admin() {
                    self.show_alert("Only admins can register certificates", AlertKind::Error);
                    return;
                }
                if self.reject_unbound(&ControlId::RegisterSubmit) {
                    return;
                }
                self.submit_registration();
            }
            Command::Verify => {
                if self.reject_unbound(&ControlId::VerifySubmit) {
                    return;
                }
                self.submit_verification();
            }
            Command::List => {
                if !self.session.is_admin() {
                    self.show_alert("Only admins can view all certificates", AlertKind::Error);
                    return;
                }
                if self.reject_unbound(&ControlId::ViewAllButton) {
                    return;
                }
                self.request_list();
            }
            Command::Revoke(raw_id) => {
                if !self.session.is_admin() {
                    self.show_alert("Only admins can revoke certificates", AlertKind::Error);
                    return;
                }
                let id = CertificateId(raw_id);
                if self.reject_unbound(&ControlId::Revoke(id.clone())) {
                    return;
                }
                self.request_revoke(id);
            }
            Command::Back => {
                if self.tree.is_bound(&ControlId::BackToVerify) {
                    self.navigate(NavTarget::Verify);
                } else if self.tree.is_bound(&ControlId::BackToAdmin) {
                    self.navigate(NavTarget::Admin);
                } else {
                    self.advise_unbound();
                }
            }
            // Meta commands are handled by the front-end loop.
            Command::Show | Command::Help | Command::Quit => {}
        }
    }

    /// Reject a command whose control is not bound in the current tree.
    fn reject_unbound(&mut self, control: &ControlId) -> bool {
        if self.tree.is_bound(control) {
            false
        } else {
            self.advise_unbound();
            true
        }
    }

    fn advise_unbound(&mut self) {
        self.show_alert(
            "That action isn't available on this screen",
            AlertKind::Info,
        );
    }

    fn navigate(&mut self, target: NavTarget) {
        if let Err(denied) = self.router.navigate(target, &self.session) {
            debug!(?target, ?denied, "navigation rejected");
            self.show_alert(denied.message(), AlertKind::Error);
        }
    }

    // -------------------------------------------------------------------------
    // Message handling
    // -------------------------------------------------------------------------

    fn apply_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Initialize => self.initialize(),

            Msg::SessionProbed { epoch, outcome } => {
                if !self.router.is_current(epoch) {
                    debug!("discarding stale session probe");
                    return;
                }
                match outcome {
                    Ok(Some(identity)) => self.authenticate(identity),
                    Ok(None) => info!("no existing session; staying on login"),
                    Err(e) => self.fail(AppError::AuthInit(e)),
                }
            }

            Msg::LoginResolved { epoch, outcome } => {
                self.in_flight.finish(Operation::Login);
                if !self.router.is_current(epoch) {
                    debug!("discarding stale login result");
                    return;
                }
                match outcome {
                    Ok(identity) => {
                        self.show_alert("Login successful!", AlertKind::Success);
                        self.authenticate(identity);
                    }
                    Err(e) => self.fail(AppError::Login(e)),
                }
            }

            Msg::AdminCheckResolved { epoch, outcome } => {
                if !self.router.is_current(epoch) {
                    debug!("discarding stale admin check");
                    return;
                }
                // Fail closed: an unanswered admin check means no admin view.
                let is_admin = match outcome {
                    Ok(is_admin) => is_admin,
                    Err(e) => {
                        let err = AppError::AdminCheck(e);
                        warn!(error = %err, "admin determination failed");
                        false
                    }
                };
                self.session.grant_admin(is_admin);
                self.router.enter_home(&self.session);
            }

            Msg::LogoutResolved { outcome } => {
                if let Err(e) = outcome {
                    warn!(error = %e, "remote session invalidation failed");
                }
            }

            Msg::RegisterResolved { epoch, outcome } => {
                self.in_flight.finish(Operation::Register);
                if !self.router.is_current(epoch) {
                    debug!("discarding stale registration result");
                    return;
                }
                match flatten_wire(outcome) {
                    Ok(id) => {
                        self.registration.clear();
                        self.show_alert(
                            format!("Certificate registered with ID: {id}"),
                            AlertKind::Success,
                        );
                    }
                    // The draft is kept for correction.
                    Err(e) => self.fail(e),
                }
            }

            Msg::VerifyResolved { epoch, outcome } => {
                self.in_flight.finish(Operation::Verify);
                if !self.router.is_current(epoch) {
                    debug!("discarding stale verification result");
                    return;
                }
                match outcome {
                    Ok(result) => {
                        // An invalid certificate still lands on the results
                        // screen; only transport failures stay here.
                        self.verify_form = VerifyForm::default();
                        self.router.show_results(result);
                    }
                    Err(e) => self.fail(e),
                }
            }

            Msg::ListResolved { epoch, outcome } => {
                self.in_flight.finish(Operation::List);
                if !self.router.is_current(epoch) {
                    debug!("discarding stale certificate list");
                    return;
                }
                match flatten_wire(outcome) {
                    Ok(certificates) => self.router.show_certificates(certificates),
                    Err(e) => self.fail(e),
                }
            }

            Msg::RevokeResolved { epoch, id, outcome } => {
                self.in_flight.finish(Operation::Revoke);
                if !self.router.is_current(epoch) {
                    debug!("discarding stale revocation result");
                    return;
                }
                match flatten_wire(outcome) {
                    Ok(_) => {
                        self.show_alert(
                            format!("Certificate {id} has been revoked"),
                            AlertKind::Success,
                        );
                        // Read-after-write: refresh the displayed set. Skip
                        // silently if a listing is already pending.
                        if self.in_flight.begin(Operation::List) {
                            self.spawn_list_effect();
                        }
                    }
                    Err(e) => self.fail(e),
                }
            }

            Msg::AlertExpired { generation } => {
                self.alerts.expire(generation);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    fn initialize(&mut self) {
        let epoch = self.router.epoch();
        let identity = Arc::clone(&self.identity);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = match identity.is_authenticated().await {
                Ok(true) => identity.identity().await.map(Some),
                Ok(false) => Ok(None),
                Err(e) => Err(e),
            };
            let _ = tx.send(Msg::SessionProbed { epoch, outcome });
        });
    }

    fn start_login(&mut self) {
        if !self.in_flight.begin(Operation::Login) {
            self.advise_in_flight(Operation::Login);
            return;
        }
        let epoch = self.router.epoch();
        let identity = Arc::clone(&self.identity);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = identity.login().await;
            let _ = tx.send(Msg::LoginResolved { epoch, outcome });
        });
    }

    /// Called once a valid identity is obtained (probe or login). Marks the
    /// session authenticated and kicks off the admin determination; the view
    /// transition happens when that check resolves.
    fn authenticate(&mut self, identity: Identity) {
        info!(principal = %identity.principal, "authenticated");
        self.session = Session::authenticated(identity.principal.clone());
        self.show_alert(
            format!("Your Principal ID: {}", identity.principal),
            AlertKind::Info,
        );

        let epoch = self.router.epoch();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = gateway.is_current_user_admin().await;
            let _ = tx.send(Msg::AdminCheckResolved { epoch, outcome });
        });
    }

    /// Clears local state immediately and invalidates the remote session in
    /// the background; the epoch bump orphans every in-flight completion.
    fn logout(&mut self) {
        info!("logging out");
        self.session.reset();
        self.registration.clear();
        self.verify_form = VerifyForm::default();
        self.router.reset_to_login();

        let identity = Arc::clone(&self.identity);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = identity.logout().await;
            let _ = tx.send(Msg::LogoutResolved { outcome });
        });
    }

    // -------------------------------------------------------------------------
    // Certificate operations
    // -------------------------------------------------------------------------

    fn submit_registration(&mut self) {
        let Some(path) = self.registration.file.clone() else {
            self.fail(AppError::Validation(
                "Please select a certificate image".into(),
            ));
            return;
        };
        if let Some(field) = self.registration.metadata.first_missing_field() {
            self.fail(AppError::Validation(format!(
                "Please fill in the {field} field"
            )));
            return;
        }
        if !self.in_flight.begin(Operation::Register) {
            self.advise_in_flight(Operation::Register);
            return;
        }

        let metadata = self.registration.metadata.clone();
        let epoch = self.router.epoch();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) if bytes.is_empty() => Err(AppError::Validation(
                    "Please select a certificate image".into(),
                )),
                Ok(bytes) => gateway
                    .register_certificate(bytes, metadata)
                    .await
                    .map_err(|e| AppError::Remote(RemoteFailure::Transport(e))),
                Err(e) => Err(AppError::PayloadRead(e)),
            };
            let _ = tx.send(Msg::RegisterResolved { epoch, outcome });
        });
    }

    fn submit_verification(&mut self) {
        let Some(path) = self.verify_form.file.clone() else {
            self.fail(AppError::Validation(
                "Please select a certificate image to verify".into(),
            ));
            return;
        };
        if !self.in_flight.begin(Operation::Verify) {
            self.advise_in_flight(Operation::Verify);
            return;
        }

        let epoch = self.router.epoch();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) if bytes.is_empty() => Err(AppError::Validation(
                    "Please select a certificate image to verify".into(),
                )),
                Ok(bytes) => gateway
                    .verify_certificate(bytes)
                    .await
                    .map_err(|e| AppError::Remote(RemoteFailure::Transport(e))),
                Err(e) => Err(AppError::PayloadRead(e)),
            };
            let _ = tx.send(Msg::VerifyResolved { epoch, outcome });
        });
    }

    fn request_list(&mut self) {
        if !self.in_flight.begin(Operation::List) {
            self.advise_in_flight(Operation::List);
            return;
        }
        self.spawn_list_effect();
    }

    /// Issue the listing round trip. The caller holds the `List` guard.
    fn spawn_list_effect(&mut self) {
        let epoch = self.router.epoch();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = gateway
                .list_all_certificates()
                .await
                .map_err(|e| AppError::Remote(RemoteFailure::Transport(e)));
            let _ = tx.send(Msg::ListResolved { epoch, outcome });
        });
    }

    fn request_revoke(&mut self, id: CertificateId) {
        if !self.in_flight.begin(Operation::Revoke) {
            self.advise_in_flight(Operation::Revoke);
            return;
        }
        let epoch = self.router.epoch();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = gateway
                .revoke_certificate(id.clone())
                .await
                .map_err(|e| AppError::Remote(RemoteFailure::Transport(e)));
            let _ = tx.send(Msg::RevokeResolved { epoch, id, outcome });
        });
    }

    // -------------------------------------------------------------------------
    // Alerts & failures
    // -------------------------------------------------------------------------

    fn show_alert(&mut self, text: impl Into<String>, kind: AlertKind) {
        let (generation, token) = self.alerts.show(text, kind);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(ALERT_TTL) => {
                    let _ = tx.send(Msg::AlertExpired { generation });
                }
            }
        });
    }

    /// Handler-boundary conversion: log the detail, alert the sentence.
    fn fail(&mut self, error: AppError) {
        warn!(error = %error, detail = ?error, "operation failed");
        self.show_alert(error.to_string(), AlertKind::Error);
    }

    fn advise_in_flight(&mut self, op: Operation) {
        self.show_alert(
            format!("{} already in progress", op.label()),
            AlertKind::Info,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use crate::models::{CertificateMetadata, ErrorKind};
    use crate::state::FormField;

    // -------------------------------------------------------------------------
    // Mocks
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MockIdentity {
        authenticated: bool,
        probe_fails: bool,
        login_outcomes: Mutex<VecDeque<Result<Identity, IdentityError>>>,
        login_calls: AtomicUsize,
    }

    impl MockIdentity {
        fn with_login(outcome: Result<Identity, IdentityError>) -> Self {
            let mock = Self::default();
            mock.login_outcomes.lock().unwrap().push_back(outcome);
            mock
        }
    }

    impl IdentityProvider for MockIdentity {
        async fn is_authenticated(&self) -> Result<bool, IdentityError> {
            if self.probe_fails {
                Err(IdentityError::Request("provider unreachable".into()))
            } else {
                Ok(self.authenticated)
            }
        }

        async fn login(&self) -> Result<Identity, IdentityError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            self.login_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(IdentityError::Denied))
        }

        async fn logout(&self) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn identity(&self) -> Result<Identity, IdentityError> {
            Ok(Identity {
                principal: "probe-principal".into(),
            })
        }
    }

    #[derive(Default)]
    struct MockGateway {
        admin_outcomes: Mutex<VecDeque<Result<bool, GatewayError>>>,
        register_outcomes: Mutex<VecDeque<Result<RemoteOutcome<CertificateId>, GatewayError>>>,
        verify_outcomes: Mutex<VecDeque<Result<VerificationResult, GatewayError>>>,
        list_outcomes: Mutex<VecDeque<Result<RemoteOutcome<Vec<Certificate>>, GatewayError>>>,
        revoke_outcomes: Mutex<VecDeque<Result<RemoteOutcome<CertificateId>, GatewayError>>>,
        register_calls: AtomicUsize,
        verify_calls: AtomicUsize,
        list_calls: AtomicUsize,
        revoke_calls: AtomicUsize,
    }

    impl MockGateway {
        fn admin(self, is_admin: bool) -> Self {
            self.admin_outcomes.lock().unwrap().push_back(Ok(is_admin));
            self
        }

        fn register(self, outcome: Result<RemoteOutcome<CertificateId>, GatewayError>) -> Self {
            self.register_outcomes.lock().unwrap().push_back(outcome);
            self
        }

        fn verify(self, outcome: Result<VerificationResult, GatewayError>) -> Self {
            self.verify_outcomes.lock().unwrap().push_back(outcome);
            self
        }

        fn list(self, outcome: Result<RemoteOutcome<Vec<Certificate>>, GatewayError>) -> Self {
            self.list_outcomes.lock().unwrap().push_back(outcome);
            self
        }

        fn revoke(self, outcome: Result<RemoteOutcome<CertificateId>, GatewayError>) -> Self {
            self.revoke_outcomes.lock().unwrap().push_back(outcome);
            self
        }
    }

    impl CertificateGateway for MockGateway {
        async fn is_current_user_admin(&self) -> Result<bool, GatewayError> {
            self.admin_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(false))
        }

        async fn register_certificate(
            &self,
            _payload: Vec<u8>,
            _metadata: CertificateMetadata,
        ) -> Result<RemoteOutcome<CertificateId>, GatewayError> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            self.register_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(RemoteOutcome::Ok(CertificateId("fallback".into()))))
        }

        async fn verify_certificate(
            &self,
            _payload: Vec<u8>,
        ) -> Result<VerificationResult, GatewayError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.verify_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(VerificationResult {
                    is_valid: false,
                    message: "no outcome queued".into(),
                    certificate: None,
                }))
        }

        async fn list_all_certificates(
            &self,
        ) -> Result<RemoteOutcome<Vec<Certificate>>, GatewayError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.list_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(RemoteOutcome::Ok(Vec::new())))
        }

        async fn revoke_certificate(
            &self,
            _id: CertificateId,
        ) -> Result<RemoteOutcome<CertificateId>, GatewayError> {
            self.revoke_calls.fetch_add(1, Ordering::SeqCst);
            self.revoke_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(RemoteOutcome::Ok(CertificateId("fallback".into()))))
        }
    }

    // -------------------------------------------------------------------------
    // Harness
    // -------------------------------------------------------------------------

    type TestApp = App<MockIdentity, MockGateway>;

    fn build(
        identity: MockIdentity,
        gateway: MockGateway,
    ) -> (TestApp, UnboundedReceiver<Msg>, Arc<MockGateway>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(gateway);
        let app = App::new(Arc::new(identity), Arc::clone(&gateway), tx);
        (app, rx, gateway)
    }

    /// Feed pending completions into the app until the channel stays quiet.
    /// Alert-expiry timers fire seconds out, so a short timeout skips them.
    async fn drain(app: &mut TestApp, rx: &mut UnboundedReceiver<Msg>) {
        while let Ok(Some(msg)) =
            tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
        {
            app.update(msg);
        }
    }

    fn alert_text(app: &TestApp) -> Option<String> {
        app.tree().alert.as_ref().map(|a| a.text.clone())
    }

    fn fill_registration(app: &mut TestApp) {
        app.apply_command(Command::Set(FormField::Name, "Rust Cert".into()));
        app.apply_command(Command::Set(FormField::Issuer, "Acme".into()));
        app.apply_command(Command::Set(FormField::IssuedTo, "Ada".into()));
        app.apply_command(Command::Set(FormField::IssueDate, "2026-01-01".into()));
        app.apply_command(Command::Set(FormField::Description, "Completion".into()));
        app.apply_command(Command::Set(FormField::Type, "diploma".into()));
    }

    fn temp_certificate_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake certificate image bytes").unwrap();
        file
    }

    fn sample_certificate(id: &str) -> Certificate {
        Certificate {
            id: CertificateId(id.into()),
            metadata: CertificateMetadata {
                name: format!("Cert {id}"),
                issuer: "Acme".into(),
                issued_to: "Ada".into(),
                issue_date: "2026-01-01".into(),
                description: "Completion".into(),
                certificate_type: "diploma".into(),
            },
        }
    }

    /// Drive the full login flow so the app lands on its home view.
    async fn login(
        app: &mut TestApp,
        rx: &mut UnboundedReceiver<Msg>,
    ) {
        app.apply_command(Command::Login);
        drain(app, rx).await;
    }

    fn admin_fixture(gateway: MockGateway) -> (TestApp, UnboundedReceiver<Msg>, Arc<MockGateway>) {
        build(
            MockIdentity::with_login(Ok(Identity {
                principal: "admin-principal".into(),
            })),
            gateway.admin(true),
        )
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn initialize_without_session_lands_on_login() {
        let (mut app, mut rx, _) = build(MockIdentity::default(), MockGateway::default());
        app.update(Msg::Initialize);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Login);
        assert!(!app.session().is_authenticated());
    }

    #[tokio::test]
    async fn initialize_with_existing_session_authenticates() {
        let identity = MockIdentity {
            authenticated: true,
            ..Default::default()
        };
        let (mut app, mut rx, _) = build(identity, MockGateway::default().admin(false));
        app.update(Msg::Initialize);
        drain(&mut app, &mut rx).await;

        assert!(app.session().is_authenticated());
        assert_eq!(app.session().principal_id(), Some("probe-principal"));
        assert_eq!(app.view(), &ViewState::Verify);
    }

    #[tokio::test]
    async fn provider_failure_on_initialize_stays_unauthenticated() {
        let identity = MockIdentity {
            probe_fails: true,
            ..Default::default()
        };
        let (mut app, mut rx, _) = build(identity, MockGateway::default());
        app.update(Msg::Initialize);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Login);
        assert!(!app.session().is_authenticated());
        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Authentication initialization failed")
        );
    }

    #[tokio::test]
    async fn admin_login_routes_to_admin_panel_and_shows_principal() {
        let (mut app, mut rx, _) = admin_fixture(MockGateway::default());
        login(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Admin);
        assert!(app.session().is_admin());
        assert!(app.session().is_authenticated());
        let alert = alert_text(&app).expect("principal alert should be visible");
        assert!(alert.contains("admin-principal"));
    }

    #[tokio::test]
    async fn non_admin_login_routes_to_verify() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false),
        );
        login(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Verify);
        assert!(!app.session().is_admin());
    }

    #[tokio::test]
    async fn failed_admin_check_fails_closed_to_verify() {
        let gateway = MockGateway::default();
        gateway
            .admin_outcomes
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Request("admin check down".into())));
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            gateway,
        );
        login(&mut app, &mut rx).await;

        // Still authenticated: the admin check is not an auth failure.
        assert!(app.session().is_authenticated());
        assert!(!app.session().is_admin());
        assert_eq!(app.view(), &ViewState::Verify);
    }

    #[tokio::test]
    async fn canceled_login_shows_failure_alert() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Err(IdentityError::Denied)),
            MockGateway::default(),
        );
        login(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Login);
        assert!(!app.session().is_authenticated());
        assert_eq!(alert_text(&app).as_deref(), Some("Login canceled or failed"));
    }

    #[tokio::test]
    async fn logout_resets_session_and_view() {
        let (mut app, mut rx, _) = admin_fixture(MockGateway::default());
        login(&mut app, &mut rx).await;

        app.apply_command(Command::Logout);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Login);
        assert!(!app.session().is_authenticated());
        assert!(!app.session().is_admin());
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn non_admin_registration_is_rejected_client_side() {
        let (mut app, mut rx, gateway) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false),
        );
        login(&mut app, &mut rx).await;

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Only admins can register certificates")
        );
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registration_without_file_is_rejected_before_any_remote_call() {
        let (mut app, mut rx, gateway) = admin_fixture(MockGateway::default());
        login(&mut app, &mut rx).await;
        fill_registration(&mut app);

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Please select a certificate image")
        );
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registration_with_missing_field_is_rejected() {
        let (mut app, mut rx, gateway) = admin_fixture(MockGateway::default());
        login(&mut app, &mut rx).await;
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Please fill in the name field")
        );
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_registration_clears_the_form() {
        let (mut app, mut rx, gateway) = admin_fixture(
            MockGateway::default().register(Ok(RemoteOutcome::Ok(CertificateId("17".into())))),
        );
        login(&mut app, &mut rx).await;
        fill_registration(&mut app);
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Certificate registered with ID: 17")
        );
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 1);
        // Form cleared on success.
        assert_eq!(app.registration, RegistrationForm::default());
    }

    #[tokio::test]
    async fn duplicate_id_keeps_the_form_for_correction() {
        let (mut app, mut rx, _) = admin_fixture(
            MockGateway::default().register(Ok(RemoteOutcome::Err(ErrorKind::DuplicateId))),
        );
        login(&mut app, &mut rx).await;
        fill_registration(&mut app);
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(alert_text(&app).as_deref(), Some("Error: DuplicateId"));
        // Form is NOT reset on failure.
        assert_eq!(app.registration.metadata.name, "Rust Cert");
        assert!(app.registration.file.is_some());
    }

    #[tokio::test]
    async fn transport_failure_on_registration_reports_identically() {
        let (mut app, mut rx, _) = admin_fixture(
            MockGateway::default().register(Err(GatewayError::Request("timeout".into()))),
        );
        login(&mut app, &mut rx).await;
        fill_registration(&mut app);
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(alert_text(&app).as_deref(), Some("Error: TransportFailure"));
        assert_eq!(app.view(), &ViewState::Admin);
    }

    #[tokio::test]
    async fn second_registration_while_pending_is_rejected() {
        let (mut app, mut rx, gateway) = admin_fixture(
            MockGateway::default().register(Ok(RemoteOutcome::Ok(CertificateId("17".into())))),
        );
        login(&mut app, &mut rx).await;
        fill_registration(&mut app);
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Register);
        // The first submission has not resolved yet; re-submit immediately.
        app.apply_command(Command::Register);
        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Registration already in progress")
        );

        drain(&mut app, &mut rx).await;
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 1);
    }

    // -------------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn verification_failure_is_a_result_not_an_error() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false).verify(Ok(VerificationResult {
                is_valid: false,
                message: "hash mismatch".into(),
                certificate: None,
            })),
        );
        login(&mut app, &mut rx).await;
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Verify);
        drain(&mut app, &mut rx).await;

        match app.view() {
            ViewState::Results(result) => {
                assert!(!result.is_valid);
                assert_eq!(result.message, "hash mismatch");
                assert!(result.certificate.is_none());
            }
            other => panic!("expected results view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_verification_carries_the_certificate() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false).verify(Ok(VerificationResult {
                is_valid: true,
                message: "verified".into(),
                certificate: Some(sample_certificate("7")),
            })),
        );
        login(&mut app, &mut rx).await;
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Verify);
        drain(&mut app, &mut rx).await;

        match app.view() {
            ViewState::Results(result) => {
                assert!(result.is_valid);
                assert_eq!(
                    result.certificate.as_ref().map(|c| c.id.clone()),
                    Some(CertificateId("7".into()))
                );
            }
            other => panic!("expected results view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verification_without_file_is_rejected() {
        let (mut app, mut rx, gateway) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false),
        );
        login(&mut app, &mut rx).await;

        app.apply_command(Command::Verify);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Please select a certificate image to verify")
        );
        assert_eq!(gateway.verify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.view(), &ViewState::Verify);
    }

    #[tokio::test]
    async fn transport_failure_on_verification_stays_on_verify() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default()
                .admin(false)
                .verify(Err(GatewayError::Request("timeout".into()))),
        );
        login(&mut app, &mut rx).await;
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));

        app.apply_command(Command::Verify);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Verify);
        assert_eq!(alert_text(&app).as_deref(), Some("Error: TransportFailure"));
    }

    // -------------------------------------------------------------------------
    // Listing & revocation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn listing_enters_the_certificates_view() {
        let certs = vec![sample_certificate("1"), sample_certificate("2")];
        let (mut app, mut rx, _) =
            admin_fixture(MockGateway::default().list(Ok(RemoteOutcome::Ok(certs.clone()))));
        login(&mut app, &mut rx).await;

        app.apply_command(Command::List);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::CertificatesList(certs));
    }

    #[tokio::test]
    async fn revoking_refreshes_the_displayed_list() {
        let before = vec![sample_certificate("1"), sample_certificate("2")];
        let after = vec![sample_certificate("2")];
        let (mut app, mut rx, gateway) = admin_fixture(
            MockGateway::default()
                .list(Ok(RemoteOutcome::Ok(before)))
                .revoke(Ok(RemoteOutcome::Ok(CertificateId("1".into()))))
                .list(Ok(RemoteOutcome::Ok(after.clone()))),
        );
        login(&mut app, &mut rx).await;
        app.apply_command(Command::List);
        drain(&mut app, &mut rx).await;

        app.apply_command(Command::Revoke("1".into()));
        drain(&mut app, &mut rx).await;

        // Read-after-write: the revoked id is gone from the refreshed view.
        assert_eq!(app.view(), &ViewState::CertificatesList(after));
        assert_eq!(gateway.revoke_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn revoking_an_id_not_displayed_is_rejected() {
        let (mut app, mut rx, gateway) = admin_fixture(
            MockGateway::default().list(Ok(RemoteOutcome::Ok(vec![sample_certificate("1")]))),
        );
        login(&mut app, &mut rx).await;
        app.apply_command(Command::List);
        drain(&mut app, &mut rx).await;

        app.apply_command(Command::Revoke("999".into()));
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("That action isn't available on this screen")
        );
        assert_eq!(gateway.revoke_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_admin_listing_is_rejected_client_side() {
        let (mut app, mut rx, gateway) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false),
        );
        login(&mut app, &mut rx).await;

        app.apply_command(Command::List);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("Only admins can view all certificates")
        );
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_error_on_listing_keeps_the_current_view() {
        let (mut app, mut rx, _) = admin_fixture(
            MockGateway::default().list(Ok(RemoteOutcome::Err(ErrorKind::NotAuthorized))),
        );
        login(&mut app, &mut rx).await;

        app.apply_command(Command::List);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Admin);
        assert_eq!(alert_text(&app).as_deref(), Some("Error: NotAuthorized"));
    }

    // -------------------------------------------------------------------------
    // Staleness & routing
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn list_result_arriving_after_logout_is_discarded() {
        let (mut app, mut rx, _) = admin_fixture(
            MockGateway::default().list(Ok(RemoteOutcome::Ok(vec![sample_certificate("1")]))),
        );
        login(&mut app, &mut rx).await;

        // Issue the listing, then log out before its completion is applied.
        app.apply_command(Command::List);
        app.apply_command(Command::Logout);
        drain(&mut app, &mut rx).await;

        assert_eq!(app.view(), &ViewState::Login);
        assert!(!app.session().is_authenticated());
    }

    #[tokio::test]
    async fn unauthenticated_navigation_shows_an_advisory() {
        let (mut app, mut rx, _) = build(MockIdentity::default(), MockGateway::default());
        app.update(Msg::Initialize);
        drain(&mut app, &mut rx).await;

        app.apply_command(Command::Nav(NavTarget::Verify));
        assert_eq!(app.view(), &ViewState::Login);
        assert_eq!(alert_text(&app).as_deref(), Some("Please log in first"));
    }

    #[tokio::test]
    async fn register_command_is_unbound_outside_the_admin_view() {
        let (mut app, mut rx, gateway) = admin_fixture(MockGateway::default());
        login(&mut app, &mut rx).await;
        app.apply_command(Command::Nav(NavTarget::Verify));

        app.apply_command(Command::Register);
        drain(&mut app, &mut rx).await;

        assert_eq!(
            alert_text(&app).as_deref(),
            Some("That action isn't available on this screen")
        );
        assert_eq!(gateway.register_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn back_returns_from_results_to_verify() {
        let (mut app, mut rx, _) = build(
            MockIdentity::with_login(Ok(Identity {
                principal: "user-principal".into(),
            })),
            MockGateway::default().admin(false).verify(Ok(VerificationResult {
                is_valid: false,
                message: "hash mismatch".into(),
                certificate: None,
            })),
        );
        login(&mut app, &mut rx).await;
        let file = temp_certificate_file();
        app.apply_command(Command::Attach(file.path().to_path_buf()));
        app.apply_command(Command::Verify);
        drain(&mut app, &mut rx).await;
        assert!(matches!(app.view(), ViewState::Results(_)));

        app.apply_command(Command::Back);
        assert_eq!(app.view(), &ViewState::Verify);
    }

    // -------------------------------------------------------------------------
    // Alerts
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn alert_clears_itself_after_five_seconds() {
        let (mut app, mut rx, _) = build(MockIdentity::default(), MockGateway::default());
        app.apply_command(Command::Nav(NavTarget::Verify));
        assert!(alert_text(&app).is_some());

        // The paused clock auto-advances to the expiry timer.
        let msg = rx.recv().await.expect("expiry message");
        assert!(matches!(msg, Msg::AlertExpired { .. }));
        app.update(msg);
        assert!(alert_text(&app).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_alert_timer_cannot_clear_the_newer_alert() {
        let (mut app, mut rx, _) = build(MockIdentity::default(), MockGateway::default());
        app.apply_command(Command::Nav(NavTarget::Verify));
        app.apply_command(Command::Nav(NavTarget::Admin));
        assert_eq!(alert_text(&app).as_deref(), Some("Please log in first"));

        // Only the newer alert's timer survives; its expiry clears the slot.
        let msg = rx.recv().await.expect("expiry message");
        app.update(msg);
        assert!(alert_text(&app).is_none());

        // No second expiry is pending.
        assert!(
            tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .is_err(),
            "superseded timer should have been canceled"
        );
    }
}

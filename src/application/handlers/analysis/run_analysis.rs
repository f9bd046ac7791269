//! Usage-gated analysis pipeline.
//!
//! Every billable endpoint runs the same sequence: resolve the caller's quota
//! state, check, run inference, then commit the charge. The check is purely
//! advisory for concurrency purposes; the commit is an atomic conditional
//! decrement at the store, so a losing racer is never driven negative. A
//! failed inference call is never charged.

use std::sync::Arc;

use crate::domain::credits::{
    check, Caller, QuotaDecision, ServiceKind, VisitorUsage,
};
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{
    AlertNotifier, AnalysisReport, AuthenticatedUser, DebitOutcome, DetectionError,
    EntitlementStore, ImageAnalysisRequest, ResultStore, SavedResult, TextAnalysisRequest,
    TextAnalyzer, TextSurface, VisionAnalyzer,
};

/// Who is making the request.
#[derive(Debug, Clone)]
pub enum RequestIdentity {
    User(AuthenticatedUser),
    Visitor(VisitorUsage),
}

/// Validated analysis input, ready for the provider.
pub enum AnalysisInput {
    Text { surface: TextSurface, text: String },
    Image { media_type: String, bytes: Vec<u8> },
}

impl AnalysisInput {
    fn service(&self) -> ServiceKind {
        match self {
            AnalysisInput::Text { surface, .. } => match surface {
                TextSurface::Resume => ServiceKind::Resume,
                TextSurface::Essay => ServiceKind::Essay,
                TextSurface::Profile => ServiceKind::Profile,
            },
            AnalysisInput::Image { .. } => ServiceKind::Photo,
        }
    }
}

/// How the completed analysis was paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Credits were debited from the user's balance.
    CreditsCharged { cost: u32, remaining: i64 },
    /// Anonymous analysis; the visitor counter was bumped.
    VisitorCounted { usage: VisitorUsage },
    /// The debit lost a concurrent race after inference. The result is still
    /// returned; the balance is left untouched.
    NotCharged,
}

/// Result of a successful pipeline run.
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub charge: ChargeOutcome,
}

/// Pipeline failure modes.
#[derive(Debug)]
pub enum AnalysisError {
    /// Quota check failed for an authenticated user.
    InsufficientCredits { required: u32, available: i64 },
    /// Quota check failed for an anonymous visitor.
    VisitorLimitExceeded { limit: u32 },
    /// Provider reported overload. Operator alerted, caller not charged.
    Overloaded,
    /// Provider call failed. Caller not charged.
    Failed(String),
    /// Store access failed.
    Store(DomainError),
}

impl From<DomainError> for AnalysisError {
    fn from(err: DomainError) -> Self {
        AnalysisError::Store(err)
    }
}

/// Orchestrates quota gating, inference, and the deduction commit.
pub struct AnalysisService {
    entitlements: Arc<dyn EntitlementStore>,
    text_analyzer: Arc<dyn TextAnalyzer>,
    vision_analyzer: Arc<dyn VisionAnalyzer>,
    results: Arc<dyn ResultStore>,
    alerts: Arc<dyn AlertNotifier>,
}

impl AnalysisService {
    pub fn new(
        entitlements: Arc<dyn EntitlementStore>,
        text_analyzer: Arc<dyn TextAnalyzer>,
        vision_analyzer: Arc<dyn VisionAnalyzer>,
        results: Arc<dyn ResultStore>,
        alerts: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            entitlements,
            text_analyzer,
            vision_analyzer,
            results,
            alerts,
        }
    }

    /// Runs one gated analysis.
    pub async fn run(
        &self,
        identity: RequestIdentity,
        input: AnalysisInput,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let service = input.service();

        self.check_quota(&identity, service).await?;

        let report = self.infer(service, input).await?;

        let charge = self.commit(&identity, service).await?;

        if let RequestIdentity::User(user) = &identity {
            self.save_result(&user.id, service, &report).await;
        }

        tracing::info!(
            service = service.as_str(),
            ai_score = report.ai_score,
            "Analysis completed"
        );

        Ok(AnalysisOutcome { report, charge })
    }

    /// Checks the caller's quota for `service` without running inference.
    ///
    /// Endpoints with expensive input handling (PDF extraction, image
    /// buffering) call this before touching the upload so an exhausted
    /// caller is turned away first. `run` repeats the check; the second
    /// pass is a cheap re-read.
    pub async fn check_quota(
        &self,
        identity: &RequestIdentity,
        service: ServiceKind,
    ) -> Result<(), AnalysisError> {
        let caller = self.resolve_caller(identity).await?;
        match check(&caller, service) {
            QuotaDecision::Allowed => Ok(()),
            QuotaDecision::InsufficientCredits {
                required,
                available,
            } => Err(AnalysisError::InsufficientCredits {
                required,
                available,
            }),
            QuotaDecision::VisitorLimitExceeded { limit } => {
                Err(AnalysisError::VisitorLimitExceeded { limit })
            }
        }
    }

    /// Resolves the caller's quota state from the store or the cookie.
    async fn resolve_caller(&self, identity: &RequestIdentity) -> Result<Caller, AnalysisError> {
        match identity {
            RequestIdentity::User(user) => {
                // Missing profile row resolves to zero credits.
                let balance = self
                    .entitlements
                    .credit_balance(&user.id)
                    .await?
                    .unwrap_or(0);
                Ok(Caller::User {
                    id: user.id.clone(),
                    balance,
                })
            }
            RequestIdentity::Visitor(usage) => Ok(Caller::Visitor { usage: *usage }),
        }
    }

    async fn infer(
        &self,
        service: ServiceKind,
        input: AnalysisInput,
    ) -> Result<AnalysisReport, AnalysisError> {
        let result = match input {
            AnalysisInput::Text { surface, text } => {
                self.text_analyzer
                    .analyze_text(TextAnalysisRequest { surface, text })
                    .await
            }
            AnalysisInput::Image { media_type, bytes } => {
                self.vision_analyzer
                    .analyze_image(ImageAnalysisRequest { media_type, bytes })
                    .await
            }
        };

        match result {
            Ok(report) => Ok(report),
            Err(DetectionError::RateLimited) => {
                self.alerts
                    .notify_overload(service.as_str(), "provider returned overload status")
                    .await;
                Err(AnalysisError::Overloaded)
            }
            Err(e) => {
                tracing::error!(service = service.as_str(), error = %e, "Analysis failed");
                Err(AnalysisError::Failed(e.to_string()))
            }
        }
    }

    /// Commits the charge after successful inference.
    async fn commit(
        &self,
        identity: &RequestIdentity,
        service: ServiceKind,
    ) -> Result<ChargeOutcome, AnalysisError> {
        match identity {
            RequestIdentity::User(user) => {
                let cost = service.cost();
                match self.entitlements.debit_credits(&user.id, cost).await? {
                    DebitOutcome::Debited { remaining } => {
                        Ok(ChargeOutcome::CreditsCharged { cost, remaining })
                    }
                    DebitOutcome::InsufficientCredits { available } => {
                        // Another request spent the balance between check and
                        // commit. The work is done, so the result is returned
                        // uncharged rather than failing the caller.
                        tracing::warn!(
                            user_id = %user.id,
                            service = service.as_str(),
                            available,
                            "Balance exhausted between check and commit; result not charged"
                        );
                        Ok(ChargeOutcome::NotCharged)
                    }
                }
            }
            RequestIdentity::Visitor(usage) => Ok(ChargeOutcome::VisitorCounted {
                usage: usage.incremented(),
            }),
        }
    }

    /// Best-effort persistence of the report for the user's history.
    async fn save_result(&self, user_id: &UserId, service: ServiceKind, report: &AnalysisReport) {
        let report_json = match serde_json::to_value(report) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize analysis report");
                return;
            }
        };

        let saved = SavedResult {
            user_id: user_id.clone(),
            service: service.as_str(),
            report: report_json,
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.results.save_result(saved).await {
            tracing::warn!(user_id = %user_id, error = %e, "Could not save analysis result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::ports::{
        CreditPurchase, Entitlement, SubscriptionRecord,
    };

    struct FakeEntitlements {
        balance: AtomicI64,
        has_profile: bool,
    }

    impl FakeEntitlements {
        fn with_balance(balance: i64) -> Arc<Self> {
            Arc::new(Self {
                balance: AtomicI64::new(balance),
                has_profile: true,
            })
        }

        fn without_profile() -> Arc<Self> {
            Arc::new(Self {
                balance: AtomicI64::new(0),
                has_profile: false,
            })
        }
    }

    #[async_trait]
    impl EntitlementStore for FakeEntitlements {
        async fn credit_balance(&self, _user_id: &UserId) -> Result<Option<i64>, DomainError> {
            if self.has_profile {
                Ok(Some(self.balance.load(Ordering::SeqCst)))
            } else {
                Ok(None)
            }
        }

        async fn entitlement(&self, _user_id: &UserId) -> Result<Option<Entitlement>, DomainError> {
            unimplemented!("not used by the pipeline")
        }

        async fn debit_credits(
            &self,
            _user_id: &UserId,
            amount: u32,
        ) -> Result<DebitOutcome, DomainError> {
            let cost = i64::from(amount);
            let mut current = self.balance.load(Ordering::SeqCst);
            loop {
                if current < cost {
                    return Ok(DebitOutcome::InsufficientCredits { available: current });
                }
                match self.balance.compare_exchange(
                    current,
                    current - cost,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(_) => return Ok(DebitOutcome::Debited {
                        remaining: current - cost,
                    }),
                    Err(actual) => current = actual,
                }
            }
        }

        async fn grant_credits(&self, _user_id: &UserId, amount: u32) -> Result<(), DomainError> {
            self.balance.fetch_add(i64::from(amount), Ordering::SeqCst);
            Ok(())
        }

        async fn apply_credit_purchase(
            &self,
            _purchase: CreditPurchase,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn upsert_subscription(
            &self,
            _record: SubscriptionRecord,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn find_subscription_user(
            &self,
            _stripe_subscription_id: &str,
        ) -> Result<Option<UserId>, DomainError> {
            Ok(None)
        }

        async fn cancel_subscription(
            &self,
            _stripe_subscription_id: &str,
        ) -> Result<Option<UserId>, DomainError> {
            Ok(None)
        }

        async fn mark_subscription_active(
            &self,
            _stripe_subscription_id: &str,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct FakeAnalyzer {
        result: fn() -> Result<AnalysisReport, DetectionError>,
        calls: AtomicU32,
    }

    impl FakeAnalyzer {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                result: || {
                    Ok(AnalysisReport {
                        ai_score: 60,
                        summary: "mixed signals".to_string(),
                        findings: vec![],
                        rewritten: None,
                    })
                },
                calls: AtomicU32::new(0),
            })
        }

        fn rate_limited() -> Arc<Self> {
            Arc::new(Self {
                result: || Err(DetectionError::RateLimited),
                calls: AtomicU32::new(0),
            })
        }

        fn timed_out() -> Arc<Self> {
            Arc::new(Self {
                result: || {
                    Err(DetectionError::RequestFailed(
                        "operation timed out".to_string(),
                    ))
                },
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextAnalyzer for FakeAnalyzer {
        async fn analyze_text(
            &self,
            _request: TextAnalysisRequest,
        ) -> Result<AnalysisReport, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[async_trait]
    impl VisionAnalyzer for FakeAnalyzer {
        async fn analyze_image(
            &self,
            _request: ImageAnalysisRequest,
        ) -> Result<AnalysisReport, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[derive(Default)]
    struct RecordingResults {
        saved: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl ResultStore for RecordingResults {
        async fn save_result(&self, result: SavedResult) -> Result<(), DomainError> {
            self.saved.lock().unwrap().push(result.service);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAlerts {
        raised: AtomicU32,
    }

    #[async_trait]
    impl AlertNotifier for RecordingAlerts {
        async fn notify_overload(&self, _service: &str, _detail: &str) {
            self.raised.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn service_with(
        entitlements: Arc<FakeEntitlements>,
        analyzer: Arc<FakeAnalyzer>,
    ) -> (AnalysisService, Arc<RecordingResults>, Arc<RecordingAlerts>) {
        let results = Arc::new(RecordingResults::default());
        let alerts = Arc::new(RecordingAlerts::default());
        let service = AnalysisService::new(
            entitlements,
            analyzer.clone(),
            analyzer,
            results.clone(),
            alerts.clone(),
        );
        (service, results, alerts)
    }

    fn user_identity() -> RequestIdentity {
        RequestIdentity::User(AuthenticatedUser {
            id: UserId::new("user-1").unwrap(),
            email: None,
        })
    }

    fn essay_input() -> AnalysisInput {
        AnalysisInput::Text {
            surface: TextSurface::Essay,
            text: "a".repeat(100),
        }
    }

    #[tokio::test]
    async fn user_with_credits_is_charged_after_success() {
        let entitlements = FakeEntitlements::with_balance(10);
        let (service, results, _) = service_with(entitlements, FakeAnalyzer::ok());

        let outcome = service.run(user_identity(), essay_input()).await.unwrap();

        assert_eq!(
            outcome.charge,
            ChargeOutcome::CreditsCharged {
                cost: 1,
                remaining: 9
            }
        );
        assert_eq!(*results.saved.lock().unwrap(), vec!["essay"]);
    }

    #[tokio::test]
    async fn photo_costs_five_credits() {
        let entitlements = FakeEntitlements::with_balance(5);
        let (service, _, _) = service_with(entitlements, FakeAnalyzer::ok());

        let outcome = service
            .run(
                user_identity(),
                AnalysisInput::Image {
                    media_type: "image/png".to_string(),
                    bytes: vec![0u8; 16],
                },
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.charge,
            ChargeOutcome::CreditsCharged {
                cost: 5,
                remaining: 0
            }
        );
    }

    #[tokio::test]
    async fn user_without_credits_is_rejected_before_inference() {
        let analyzer = FakeAnalyzer::ok();
        let (service, _, _) =
            service_with(FakeEntitlements::with_balance(0), analyzer.clone());

        let result = service.run(user_identity(), essay_input()).await;

        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientCredits {
                required: 1,
                available: 0
            })
        ));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn missing_profile_fails_closed() {
        let analyzer = FakeAnalyzer::ok();
        let (service, _, _) = service_with(FakeEntitlements::without_profile(), analyzer.clone());

        let result = service.run(user_identity(), essay_input()).await;

        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientCredits { available: 0, .. })
        ));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn visitor_under_limit_gets_counted_not_charged() {
        let (service, results, _) =
            service_with(FakeEntitlements::with_balance(0), FakeAnalyzer::ok());

        let outcome = service
            .run(
                RequestIdentity::Visitor(VisitorUsage::new(1)),
                essay_input(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.charge,
            ChargeOutcome::VisitorCounted {
                usage: VisitorUsage::new(2)
            }
        );
        // Visitor results are not persisted.
        assert!(results.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn visitor_at_limit_is_rejected() {
        let analyzer = FakeAnalyzer::ok();
        let (service, _, _) = service_with(FakeEntitlements::with_balance(0), analyzer.clone());

        let result = service
            .run(
                RequestIdentity::Visitor(VisitorUsage::new(2)),
                essay_input(),
            )
            .await;

        assert!(matches!(
            result,
            Err(AnalysisError::VisitorLimitExceeded { limit: 2 })
        ));
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn quota_precheck_rejects_exhausted_callers() {
        let (service, _, _) =
            service_with(FakeEntitlements::with_balance(0), FakeAnalyzer::ok());

        let broke_user = service
            .check_quota(&user_identity(), ServiceKind::Essay)
            .await;
        assert!(matches!(
            broke_user,
            Err(AnalysisError::InsufficientCredits {
                required: 1,
                available: 0
            })
        ));

        let spent_visitor = service
            .check_quota(
                &RequestIdentity::Visitor(VisitorUsage::new(2)),
                ServiceKind::Essay,
            )
            .await;
        assert!(matches!(
            spent_visitor,
            Err(AnalysisError::VisitorLimitExceeded { limit: 2 })
        ));
    }

    #[tokio::test]
    async fn quota_precheck_passes_funded_caller_without_charging() {
        let entitlements = FakeEntitlements::with_balance(5);
        let (service, _, _) = service_with(entitlements.clone(), FakeAnalyzer::ok());

        service
            .check_quota(&user_identity(), ServiceKind::Photo)
            .await
            .unwrap();

        // The precheck only reads; the commit happens after inference.
        assert_eq!(entitlements.balance.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn overloaded_provider_alerts_and_does_not_charge() {
        let entitlements = FakeEntitlements::with_balance(10);
        let (service, _, alerts) =
            service_with(entitlements.clone(), FakeAnalyzer::rate_limited());

        let result = service.run(user_identity(), essay_input()).await;

        assert!(matches!(result, Err(AnalysisError::Overloaded)));
        assert_eq!(alerts.raised.load(Ordering::SeqCst), 1);
        assert_eq!(entitlements.balance.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn provider_timeout_fails_without_overload_alert_or_charge() {
        let entitlements = FakeEntitlements::with_balance(10);
        let (service, _, alerts) =
            service_with(entitlements.clone(), FakeAnalyzer::timed_out());

        let result = service.run(user_identity(), essay_input()).await;

        // A client-side timeout is a plain failure, not provider overload.
        assert!(matches!(result, Err(AnalysisError::Failed(_))));
        assert_eq!(alerts.raised.load(Ordering::SeqCst), 0);
        assert_eq!(entitlements.balance.load(Ordering::SeqCst), 10);
    }
}

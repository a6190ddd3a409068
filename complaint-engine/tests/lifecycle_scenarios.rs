//! End-to-end behaviour of the lifecycle coordinator.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use complaint_engine::store::{InMemoryAdmissionWindowStore, InMemoryComplaintStore};
use complaint_engine::{
    Actor, AdmissionWindow, AdmissionWindowStore, Assignee, Complaint, ComplaintStatus,
    ComplaintStore, EngineConfig, EngineError, InMemoryStaffDirectory, LifecycleCoordinator,
    StaffMember, StaffRole, StoreError, SubmissionInput, TransitionMetadata, Urgency,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-05-10T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn submission(phone: &str, urgency: Urgency, district: &str) -> SubmissionInput {
    SubmissionInput {
        district: district.to_string(),
        category: "electricity".to_string(),
        urgency,
        title: "Street light out".to_string(),
        description: "The light at the corner has been dark for a week".to_string(),
        phone: phone.to_string(),
        help_offer: None,
    }
}

fn directory() -> InMemoryStaffDirectory {
    InMemoryStaffDirectory::new()
        .with_member(StaffMember::new("muk-1", "Ali", StaffRole::Muktar).in_district("District 1"))
        .with_member(StaffMember::new("muk-2", "Huda", StaffRole::Muktar).in_district("District 2"))
        .with_member(StaffMember::new("adm-1", "Sara", StaffRole::Admin))
}

fn coordinator() -> LifecycleCoordinator {
    LifecycleCoordinator::in_memory(EngineConfig::default(), Arc::new(directory())).unwrap()
}

async fn submitted(coordinator: &LifecycleCoordinator, phone: &str, urgency: Urgency) -> String {
    coordinator
        .submit_at(submission(phone, urgency, "District 1"), t0())
        .await
        .unwrap()
        .complaint_id
}

#[tokio::test]
async fn normal_complaint_routes_to_district_muktar() {
    let coordinator = coordinator();
    let receipt = coordinator
        .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
        .await
        .unwrap();

    assert_eq!(receipt.assigned_role, StaffRole::Muktar);
    assert_eq!(receipt.assignee.label(), "Ali");

    let complaint = coordinator.get(&receipt.complaint_id).await.unwrap();
    assert_eq!(complaint.assigned_district().map(|d| d.as_str()), Some("District 1"));
    assert_eq!(complaint.created_at(), t0());
}

#[tokio::test]
async fn critical_complaint_without_managers_goes_to_manager_office() {
    let coordinator = coordinator();
    let receipt = coordinator
        .submit_at(submission("0912345678", Urgency::Critical, "District 3"), t0())
        .await
        .unwrap();

    assert_eq!(receipt.assigned_role, StaffRole::Manager);
    assert_eq!(
        receipt.assignee,
        Assignee::Placeholder {
            label: "Manager Office".to_string()
        }
    );
    assert!(receipt.tracking_number.as_str().starts_with("TRK-"));
}

#[tokio::test]
async fn resubmission_within_cooldown_is_rate_limited() {
    let coordinator = coordinator();
    assert_ok!(
        coordinator
            .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
            .await
    );

    // Changing district, category or urgency does not evade the cooldown
    let mut retry = submission("0912345678", Urgency::Critical, "District 2");
    retry.category = "water".to_string();
    let err = coordinator
        .submit_at(retry, t0() + Duration::hours(1))
        .await
        .unwrap_err();

    match err {
        EngineError::RateLimited { remaining } => assert_eq!(remaining, Duration::hours(23)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn cooldown_boundary() {
    let coordinator = coordinator();
    let cooldown = Duration::hours(24);
    assert_ok!(
        coordinator
            .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
            .await
    );

    let early = coordinator
        .submit_at(
            submission("0912345678", Urgency::Normal, "District 1"),
            t0() + cooldown - Duration::seconds(1),
        )
        .await;
    match assert_err!(early) {
        EngineError::RateLimited { remaining } => assert_eq!(remaining, Duration::seconds(1)),
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // The denial above must not have reset the window
    assert_ok!(
        coordinator
            .submit_at(
                submission("0912345678", Urgency::Normal, "District 1"),
                t0() + cooldown + Duration::seconds(1),
            )
            .await
    );
}

#[tokio::test]
async fn completed_complaint_cannot_reopen() {
    let coordinator = coordinator();
    let id = submitted(&coordinator, "0912345678", Urgency::Urgent).await;
    let admin = Actor::new(StaffRole::Admin).with_staff_id("adm-1");

    coordinator
        .transition(&id, ComplaintStatus::InProgress, &admin, TransitionMetadata::none())
        .await
        .unwrap();
    coordinator
        .transition(
            &id,
            ComplaintStatus::Completed,
            &admin,
            TransitionMetadata::none().with_resolution_note("Bulb replaced"),
        )
        .await
        .unwrap();

    for role in StaffRole::all() {
        let err = coordinator
            .transition(&id, ComplaintStatus::InProgress, &Actor::new(role), TransitionMetadata::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }), "{role}: {err}");
    }

    let complaint = coordinator.get(&id).await.unwrap();
    assert_eq!(complaint.status(), ComplaintStatus::Completed);
    assert_eq!(complaint.resolution_note(), Some("Bulb replaced"));
    assert_eq!(complaint.history().len(), 2);
    assert_eq!(complaint.history()[0].staff_id.as_deref(), Some("adm-1"));
}

#[tokio::test]
async fn muktar_cannot_close() {
    let coordinator = coordinator();
    let id = submitted(&coordinator, "0912345678", Urgency::Normal).await;
    let muktar = Actor::new(StaffRole::Muktar);

    coordinator
        .transition(&id, ComplaintStatus::InProgress, &muktar, TransitionMetadata::none())
        .await
        .unwrap();

    let err = coordinator
        .transition(
            &id,
            ComplaintStatus::Closed,
            &muktar,
            TransitionMetadata::none().with_rejection_reason("Not our jurisdiction"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized { .. }));

    let closed = coordinator
        .transition(
            &id,
            ComplaintStatus::Closed,
            &Actor::new(StaffRole::Manager),
            TransitionMetadata::none().with_rejection_reason("Handed to the power utility"),
        )
        .await
        .unwrap();
    assert_eq!(closed.status(), ComplaintStatus::Closed);
    assert_eq!(closed.rejection_reason(), Some("Handed to the power utility"));
}

#[tokio::test]
async fn muktar_cannot_skip_in_progress() {
    let coordinator = coordinator();
    let id = submitted(&coordinator, "0912345678", Urgency::Normal).await;

    let err = coordinator
        .transition(
            &id,
            ComplaintStatus::Completed,
            &Actor::new(StaffRole::Muktar),
            TransitionMetadata::none().with_resolution_note("Fixed"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
    assert_eq!(
        coordinator.get(&id).await.unwrap().status(),
        ComplaintStatus::Unread
    );
}

#[tokio::test]
async fn public_lookup_by_tracking_number() {
    let coordinator = coordinator();
    let receipt = coordinator
        .submit_at(submission("0912345678", Urgency::Normal, "District 2"), t0())
        .await
        .unwrap();

    let complaint = coordinator
        .lookup(receipt.tracking_number.as_str())
        .await
        .unwrap();
    assert_eq!(complaint.id(), receipt.complaint_id);
    assert_eq!(complaint.assignee().label(), "Huda");

    let missing = coordinator.lookup("TRK-0").await;
    assert!(matches!(missing, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_submissions_from_one_contact_admit_exactly_one() {
    let coordinator = Arc::new(coordinator());

    let attempts = (0..16).map(|_| {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let limited = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::RateLimited { .. })))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(limited, 15);
}

#[tokio::test]
async fn concurrent_accept_and_reject_only_one_wins() {
    let coordinator = Arc::new(coordinator());
    let id = submitted(&coordinator, "0912345678", Urgency::Normal).await;

    let accept = {
        let coordinator = Arc::clone(&coordinator);
        let id = id.clone();
        tokio::spawn(async move {
            coordinator
                .transition(
                    &id,
                    ComplaintStatus::InProgress,
                    &Actor::new(StaffRole::Muktar),
                    TransitionMetadata::none(),
                )
                .await
        })
    };
    let reject = {
        let coordinator = Arc::clone(&coordinator);
        let id = id.clone();
        tokio::spawn(async move {
            coordinator
                .transition(
                    &id,
                    ComplaintStatus::Rejected,
                    &Actor::new(StaffRole::Admin),
                    TransitionMetadata::none().with_rejection_reason("Duplicate report"),
                )
                .await
        })
    };

    let (accept, reject) = (accept.await.unwrap(), reject.await.unwrap());
    assert!(accept.is_ok() ^ reject.is_ok());

    let complaint = coordinator.get(&id).await.unwrap();
    assert_eq!(complaint.history().len(), 1);
    if accept.is_ok() {
        assert_eq!(complaint.status(), ComplaintStatus::InProgress);
        assert!(matches!(reject, Err(EngineError::InvalidTransition { .. })));
    } else {
        assert_eq!(complaint.status(), ComplaintStatus::Rejected);
        assert!(matches!(accept, Err(EngineError::InvalidTransition { .. })));
    }
}

#[tokio::test]
async fn statuses_follow_the_machine_from_unread() {
    let coordinator = coordinator();
    let admin = Actor::new(StaffRole::Admin);
    let phones = ["0911111111", "0922222222", "0933333333"];
    let mut ids = Vec::new();
    for phone in phones {
        ids.push(submitted(&coordinator, phone, Urgency::Urgent).await);
    }

    // Throw every target at every complaint a few times and keep what sticks
    for _ in 0..3 {
        for id in &ids {
            for target in ComplaintStatus::all() {
                let metadata = TransitionMetadata::none()
                    .with_resolution_note("done")
                    .with_rejection_reason("no");
                let _ = coordinator.transition(id, target, &admin, metadata).await;
            }
        }
    }

    for id in &ids {
        let complaint = coordinator.get(id).await.unwrap();
        let history = complaint.history();
        assert!(complaint_engine::history::is_connected_walk(history));
        if matches!(
            complaint.status(),
            ComplaintStatus::Completed | ComplaintStatus::Closed
        ) {
            assert!(history.iter().any(|c| c.to == ComplaintStatus::InProgress));
        }
    }
}

/// Window store whose writes and deletes can be switched off.
#[derive(Default)]
struct FlakyWindowStore {
    inner: InMemoryAdmissionWindowStore,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

#[async_trait]
impl AdmissionWindowStore for FlakyWindowStore {
    async fn load(&self, contact: &str) -> Result<Option<AdmissionWindow>, StoreError> {
        self.inner.load(contact).await
    }

    async fn save(&self, contact: &str, window: AdmissionWindow) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("window store offline".to_string()));
        }
        self.inner.save(contact, window).await
    }

    async fn delete(&self, contact: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("window store offline".to_string()));
        }
        self.inner.delete(contact).await
    }
}

/// Complaint store whose writes can be switched off.
#[derive(Default)]
struct FlakyComplaintStore {
    inner: InMemoryComplaintStore,
    fail_writes: AtomicBool,
}

#[async_trait]
impl ComplaintStore for FlakyComplaintStore {
    async fn load(&self, id: &str) -> Result<Option<Complaint>, StoreError> {
        self.inner.load(id).await
    }

    async fn load_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Complaint>, StoreError> {
        self.inner.load_by_tracking_number(tracking_number).await
    }

    async fn save(&self, complaint: &Complaint) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("complaint store offline".to_string()));
        }
        self.inner.save(complaint).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Complaint>, StoreError> {
        self.inner.list().await
    }
}

fn flaky_coordinator() -> (LifecycleCoordinator, Arc<FlakyComplaintStore>, Arc<FlakyWindowStore>) {
    let complaints = Arc::new(FlakyComplaintStore::default());
    let windows = Arc::new(FlakyWindowStore::default());
    let coordinator = LifecycleCoordinator::new(
        EngineConfig::default(),
        Arc::new(directory()),
        complaints.clone(),
        windows.clone(),
    )
    .unwrap();
    (coordinator, complaints, windows)
}

#[tokio::test]
async fn failed_window_commit_stores_nothing() {
    let complaints = Arc::new(InMemoryComplaintStore::new());
    let windows = Arc::new(FlakyWindowStore::default());
    let coordinator = LifecycleCoordinator::new(
        EngineConfig::default(),
        Arc::new(directory()),
        complaints.clone(),
        windows.clone(),
    )
    .unwrap();

    windows.fail_writes.store(true, Ordering::SeqCst);
    let err = coordinator
        .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Storage(StoreError::Unavailable(_))));
    assert!(complaints.is_empty().await);

    windows.fail_writes.store(false, Ordering::SeqCst);
    assert_ok!(
        coordinator
            .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
            .await
    );
    assert_eq!(complaints.len().await, 1);
}

#[tokio::test]
async fn failed_complaint_write_reverts_admission_window() {
    let (coordinator, complaints, windows) = flaky_coordinator();

    complaints.fail_writes.store(true, Ordering::SeqCst);
    let err = coordinator
        .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Storage(StoreError::Unavailable(_))));
    assert!(complaints.inner.is_empty().await);
    assert!(windows.load("0912345678").await.unwrap().is_none());

    complaints.fail_writes.store(false, Ordering::SeqCst);
    assert_ok!(
        coordinator
            .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
            .await
    );
}

#[tokio::test]
async fn failed_revert_is_reported_as_rollback_failure() {
    let (coordinator, complaints, windows) = flaky_coordinator();

    complaints.fail_writes.store(true, Ordering::SeqCst);
    windows.fail_deletes.store(true, Ordering::SeqCst);
    let err = coordinator
        .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::RollbackFailed { .. }));
    assert_eq!(err.kind(), "storage");
    assert!(err.to_string().contains("rollback also failed"));
    // No complaint is ever visible without its admission
    assert!(complaints.inner.is_empty().await);
}

#[tokio::test]
async fn shorter_configured_cooldown() {
    let config = EngineConfig::default().with_cooldown_secs(600);
    let coordinator = LifecycleCoordinator::in_memory(config, Arc::new(directory())).unwrap();

    assert_ok!(
        coordinator
            .submit_at(submission("0912345678", Urgency::Normal, "District 1"), t0())
            .await
    );
    let status = coordinator
        .admission_status("0912345678", t0() + Duration::minutes(4))
        .await
        .unwrap();
    assert_eq!(
        status,
        complaint_engine::AdmissionDecision::Denied {
            remaining: Duration::minutes(6)
        }
    );
    assert_ok!(
        coordinator
            .submit_at(
                submission("0912345678", Urgency::Normal, "District 1"),
                t0() + Duration::minutes(10),
            )
            .await
    );
}

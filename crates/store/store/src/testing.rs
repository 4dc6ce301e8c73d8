use chrono::{NaiveDate, NaiveTime, Utc};
use futures::future::join_all;

use majalis_core::{
    ArtifactFormat, Attendee, AttendeeId, Certificate, CertificateId, Session, SessionId,
    SessionRoster, UserId,
};

use crate::error::StoreError;
use crate::store::CertificateStore;

/// Build the roster the conformance suite runs against.
///
/// Backends must persist this roster (session plus both attendees) before
/// calling [`run_store_conformance_tests`]. `suffix` keeps ids unique when
/// several suites share one database.
pub fn fixture_roster(suffix: &str) -> SessionRoster {
    let session_id = SessionId::new(format!("conformance-session-{suffix}"));
    let session = Session {
        id: session_id.clone(),
        owner_id: UserId::new("conformance-owner"),
        title: "Sharh al-Arba'in".to_owned(),
        presenter_name: "Sh. Muhammad ibn Salih".to_owned(),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default(),
        start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
        description: None,
        template: None,
    };
    let attendees = ["Zaid", "Huda"]
        .iter()
        .enumerate()
        .map(|(i, name)| Attendee {
            id: AttendeeId::new(format!("conformance-attendee-{suffix}-{i}")),
            session_id: session_id.clone(),
            name: (*name).to_owned(),
            email: None,
            created_at: Utc::now(),
        })
        .collect();
    SessionRoster { session, attendees }
}

/// Run the full certificate store conformance suite.
///
/// `roster` and `other` must come from [`fixture_roster`] with different
/// suffixes and already be persisted, with no certificates issued against
/// either yet.
///
/// # Errors
///
/// Returns an error if a store call fails.
pub async fn run_store_conformance_tests(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
    other: &SessionRoster,
) -> Result<(), StoreError> {
    test_roster_lookup(store, roster).await?;
    test_missing_session(store).await?;
    test_find_missing_certificate(store, roster).await?;
    test_insert_then_find(store, roster).await?;
    test_insert_existing_pair_keeps_first(store, roster).await?;
    test_concurrent_inserts_single_winner(store, roster).await?;
    test_attendee_of_other_session_rejected(store, roster, other).await?;
    test_verification_join(store, roster).await?;
    test_verification_unknown_id(store).await?;
    test_list_certificates(store, roster).await?;
    Ok(())
}

fn mint(roster: &SessionRoster, index: usize) -> Certificate {
    Certificate::mint(
        roster.session.id.clone(),
        roster.attendees[index].id.clone(),
        ArtifactFormat::ComposedPdf,
        Utc::now(),
    )
}

async fn test_roster_lookup(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let found = store
        .find_session_with_attendees(&roster.session.id)
        .await?
        .expect("fixture session should exist");
    assert_eq!(found.session.title, roster.session.title);
    assert_eq!(found.session.date, roster.session.date);
    assert_eq!(found.attendees.len(), roster.attendees.len());
    for attendee in &roster.attendees {
        assert!(
            found.attendees.iter().any(|a| a.id == attendee.id),
            "roster should contain attendee {}",
            attendee.id
        );
    }
    Ok(())
}

async fn test_missing_session(store: &dyn CertificateStore) -> Result<(), StoreError> {
    let found = store
        .find_session_with_attendees(&SessionId::new("conformance-no-such-session"))
        .await?;
    assert!(found.is_none(), "unknown session should return None");
    Ok(())
}

async fn test_find_missing_certificate(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let found = store
        .find_certificate(&roster.session.id, &roster.attendees[1].id)
        .await?;
    assert!(found.is_none(), "no certificate issued yet");
    Ok(())
}

async fn test_insert_then_find(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let cert = mint(roster, 0);
    let inserted = store.insert_certificate_if_absent(&cert).await?;
    assert!(inserted, "first insert for a pair should succeed");

    let found = store
        .find_certificate(&roster.session.id, &roster.attendees[0].id)
        .await?
        .expect("inserted certificate should be found");
    assert_eq!(found.id, cert.id);
    assert_eq!(found.format, cert.format);
    assert_eq!(found.artifact, cert.artifact);
    Ok(())
}

async fn test_insert_existing_pair_keeps_first(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let first = store
        .find_certificate(&roster.session.id, &roster.attendees[0].id)
        .await?
        .expect("certificate from previous step");

    let second = mint(roster, 0);
    let inserted = store.insert_certificate_if_absent(&second).await?;
    assert!(!inserted, "second insert for the same pair should be refused");

    let found = store
        .find_certificate(&roster.session.id, &roster.attendees[0].id)
        .await?
        .expect("certificate should still exist");
    assert_eq!(found.id, first.id, "original id should remain");
    Ok(())
}

async fn test_concurrent_inserts_single_winner(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let candidates: Vec<Certificate> = (0..8).map(|_| mint(roster, 1)).collect();
    let results = join_all(
        candidates
            .iter()
            .map(|cert| store.insert_certificate_if_absent(cert)),
    )
    .await;

    let mut winners = Vec::new();
    for (cert, result) in candidates.iter().zip(results) {
        if result? {
            winners.push(cert.id.clone());
        }
    }
    assert_eq!(winners.len(), 1, "exactly one concurrent insert should win");

    let stored = store
        .find_certificate(&roster.session.id, &roster.attendees[1].id)
        .await?
        .expect("winning certificate should be stored");
    assert_eq!(stored.id, winners[0]);
    Ok(())
}

async fn test_attendee_of_other_session_rejected(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
    other: &SessionRoster,
) -> Result<(), StoreError> {
    let cert = Certificate::mint(
        roster.session.id.clone(),
        other.attendees[0].id.clone(),
        ArtifactFormat::ComposedPdf,
        Utc::now(),
    );
    let result = store.insert_certificate_if_absent(&cert).await;
    assert!(
        matches!(result, Err(StoreError::Constraint(_))),
        "attendee of another session should be rejected, got {result:?}"
    );

    let found = store
        .find_certificate(&roster.session.id, &other.attendees[0].id)
        .await?;
    assert!(found.is_none(), "rejected certificate should not be stored");
    Ok(())
}

async fn test_verification_join(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let cert = store
        .find_certificate(&roster.session.id, &roster.attendees[0].id)
        .await?
        .expect("certificate from previous step");

    let record = store
        .find_verification(&cert.id)
        .await?
        .expect("issued certificate should verify");
    assert_eq!(record.certificate_id, cert.id);
    assert_eq!(record.attendee_name, roster.attendees[0].name);
    assert_eq!(record.session_title, roster.session.title);
    assert_eq!(record.presenter_name, roster.session.presenter_name);
    assert_eq!(record.session_date, roster.session.date_label());
    Ok(())
}

async fn test_verification_unknown_id(store: &dyn CertificateStore) -> Result<(), StoreError> {
    let record = store.find_verification(&CertificateId::generate()).await?;
    assert!(record.is_none(), "unknown id should not verify");
    Ok(())
}

async fn test_list_certificates(
    store: &dyn CertificateStore,
    roster: &SessionRoster,
) -> Result<(), StoreError> {
    let certs = store.list_certificates(&roster.session.id).await?;
    assert_eq!(certs.len(), 2, "one certificate per attendee");
    assert!(certs.iter().all(|c| c.session_id == roster.session.id));
    Ok(())
}

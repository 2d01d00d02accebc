// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end disclosure flows, wiring authority, member, relay and recipient together over the
//! in-process test doubles.
use crate::authority::{Authority, AuthorityState};
use crate::crypto::Rng;
use crate::crypto::x25519::SecretKey;
use crate::envelope::{Envelope, derive_content_key, seal_content};
use crate::identity::{Certificate, ClientIdentity, Sid};
use crate::member::{Informer, Publication, PublishError};
use crate::recipient::Reader;
use crate::relay::{Relay, RelayError};
use crate::test_utils::{LocalAuthority, MemoryLedger, TestGroupScheme};
use crate::traits::{GroupScheme, LedgerError};
use crate::wire::{
    LedgerEntry, PublishOutcome, PublishRequest, SignaturePayload, StoredRecord, encode_base64,
};

fn joined_informer(rng: &Rng) -> Informer<TestGroupScheme> {
    let mut state: AuthorityState<TestGroupScheme> = Authority::bootstrap(None, rng).unwrap();
    let client = ClientIdentity::from_bytes([7; 32]);
    let mut endpoint = LocalAuthority::new(&mut state, client, rng);
    Informer::join(&mut endpoint, rng).unwrap()
}

fn reader_identity(subject: &str, rng: &Rng) -> (Reader, Certificate) {
    let secret = SecretKey::from_bytes(rng.random_array().unwrap());
    let certificate = Certificate::new(subject, "CN=ca", secret.public_key().unwrap());
    (Reader::new(certificate.clone(), secret), certificate)
}

fn publish(
    informer: &Informer<TestGroupScheme>,
    relay: &mut Relay<TestGroupScheme, MemoryLedger>,
    recipient: &Certificate,
    payload: &str,
    rng: &Rng,
) -> PublishOutcome {
    let mut publication = Publication::new();
    publication.build_envelope(recipient, rng).unwrap();
    publication.build_content(payload, rng).unwrap();
    publication.sign(informer, rng).unwrap();
    publication.publish(relay).unwrap()
}

#[test]
fn disclosure_reaches_only_its_recipient() {
    let rng = Rng::from_seed([1; 32]);
    let informer = joined_informer(&rng);

    let (auditor, auditor_certificate) = reader_identity("CN=auditor", &rng);
    let (bystander, _) = reader_identity("CN=bystander", &rng);

    let mut ledger = MemoryLedger::new();
    ledger.register_certificate(auditor_certificate);
    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), ledger);

    // The member discovers registered recipients and resolves one by identifier, never by key.
    let sids = relay.handle_sids().unwrap();
    assert_eq!(sids, vec![Sid::from_parts("CN=auditor", "CN=ca")]);
    let recipient =
        Informer::<TestGroupScheme>::resolve_recipient(&relay, &sids[0]).unwrap();

    let outcome = publish(
        &informer,
        &mut relay,
        &recipient,
        "the audit logs were falsified",
        &rng,
    );
    assert!(matches!(outcome, PublishOutcome::Stored { .. }));

    let feed = relay.handle_list().unwrap();
    assert_eq!(feed.len(), 1);

    let report = auditor.scan(&feed);
    assert_eq!(report.matched, 1);
    assert_eq!(
        report.disclosures[0].payload,
        "the audit logs were falsified"
    );
    assert!(report.violations.is_empty());

    // Not addressed to the bystander: zero matches, no errors of any kind.
    let report = bystander.scan(&feed);
    assert_eq!(report.matched, 0);
    assert_eq!(report.skipped_malformed, 0);
    assert_eq!(report.undecryptable, 0);
    assert!(report.violations.is_empty());
}

#[test]
fn republishing_the_same_record_is_idempotent() {
    let rng = Rng::from_seed([2; 32]);
    let informer = joined_informer(&rng);
    let (_, certificate) = reader_identity("CN=auditor", &rng);

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());

    publish(&informer, &mut relay, &certificate, "finding", &rng);

    // Replay the stored record through a fresh signature: same envelope and content, same key.
    let entry = relay.handle_list().unwrap().remove(0);
    let record = StoredRecord::from_wire(&entry.value).unwrap();
    let mut replay = PublishRequest {
        envelope: record.envelope,
        content: record.content,
        signature: String::new(),
    };
    let payload = SignaturePayload::new(&replay.envelope, &replay.content)
        .to_bytes()
        .unwrap();
    let signature =
        TestGroupScheme::sign(&payload, informer.member_key(), informer.group_key(), &rng).unwrap();
    replay.signature = encode_base64(&signature);

    assert!(matches!(
        relay.handle_publish(replay).unwrap(),
        PublishOutcome::Duplicate { .. }
    ));
    assert_eq!(relay.handle_list().unwrap().len(), 1);
}

#[test]
fn content_of_a_different_envelope_is_a_binding_violation() {
    let rng = Rng::from_seed([3; 32]);
    let informer = joined_informer(&rng);

    let secret = SecretKey::from_bytes(rng.random_array().unwrap());
    let certificate = Certificate::new("CN=auditor", "CN=ca", secret.public_key().unwrap());
    let auditor = Reader::new(certificate.clone(), secret.clone());

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());
    publish(&informer, &mut relay, &certificate, "first finding", &rng);
    publish(&informer, &mut relay, &certificate, "second finding", &rng);

    let feed = relay.handle_list().unwrap();
    let first = StoredRecord::from_wire(&feed[0].value).unwrap();
    let second = StoredRecord::from_wire(&feed[1].value).unwrap();
    let first_envelope = Envelope::from_wire(&first.envelope).unwrap();
    let second_envelope = Envelope::from_wire(&second.envelope).unwrap();

    // Splice content into the first record that decrypts under its key but repeats the second
    // envelope's date and nonce, as if contents had been swapped between records sharing a key.
    let first_key = derive_content_key(
        &secret
            .calculate_agreement(&first_envelope.ephemeral_key().unwrap())
            .unwrap(),
    )
    .unwrap();
    let spliced = seal_content(&second_envelope, "second finding", &first_key, &rng).unwrap();
    let franken = StoredRecord {
        envelope: first.envelope,
        content: encode_base64(&spliced),
    };
    let tampered_feed = vec![LedgerEntry {
        hash: "franken".to_string(),
        date: feed[0].date.clone(),
        value: franken.to_wire().unwrap(),
    }];

    let report = auditor.scan(&tampered_feed);
    assert_eq!(report.matched, 0);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].0, "franken");
}

#[test]
fn contents_swapped_between_independent_records_cannot_be_decrypted() {
    let rng = Rng::from_seed([7; 32]);
    let informer = joined_informer(&rng);
    let (auditor, certificate) = reader_identity("CN=auditor", &rng);

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());
    publish(&informer, &mut relay, &certificate, "first finding", &rng);
    publish(&informer, &mut relay, &certificate, "second finding", &rng);

    let feed = relay.handle_list().unwrap();
    let first = StoredRecord::from_wire(&feed[0].value).unwrap();
    let second = StoredRecord::from_wire(&feed[1].value).unwrap();

    // Each publication derives its key from a fresh ephemeral exchange, so content moved under
    // another record's envelope fails the AEAD tag before the binding check is ever reached.
    let franken = StoredRecord {
        envelope: first.envelope,
        content: second.content,
    };
    let tampered_feed = vec![LedgerEntry {
        hash: "franken".to_string(),
        date: feed[0].date.clone(),
        value: franken.to_wire().unwrap(),
    }];

    let report = auditor.scan(&tampered_feed);
    assert_eq!(report.matched, 0);
    assert_eq!(report.undecryptable, 1);
    assert!(report.violations.is_empty());
}

#[test]
fn malformed_feed_entries_are_skipped() {
    let rng = Rng::from_seed([4; 32]);
    let informer = joined_informer(&rng);
    let (auditor, certificate) = reader_identity("CN=auditor", &rng);

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());
    publish(&informer, &mut relay, &certificate, "finding", &rng);

    let mut feed = relay.handle_list().unwrap();
    feed.push(LedgerEntry {
        hash: "junk".to_string(),
        date: "2026-01-01T00:00:00Z".to_string(),
        value: "this is not a disclosure record".to_string(),
    });

    let report = auditor.scan(&feed);
    assert_eq!(report.matched, 1);
    assert_eq!(report.skipped_malformed, 1);
    assert!(report.violations.is_empty());
}

#[test]
fn record_encrypted_towards_wrong_key_is_undecryptable() {
    let rng = Rng::from_seed([5; 32]);
    let informer = joined_informer(&rng);
    let (auditor, _) = reader_identity("CN=auditor", &rng);

    // Same subject and issuer as the auditor, so the identifier matches, but a different static
    // key.
    let decoy_secret = SecretKey::from_bytes(rng.random_array().unwrap());
    let decoy = Certificate::new("CN=auditor", "CN=ca", decoy_secret.public_key().unwrap());

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());
    publish(&informer, &mut relay, &decoy, "finding", &rng);

    let report = auditor.scan(&relay.handle_list().unwrap());
    assert_eq!(report.matched, 0);
    assert_eq!(report.undecryptable, 1);
    assert!(report.violations.is_empty());
}

#[test]
fn unsigned_publication_cannot_be_published() {
    let rng = Rng::from_seed([8; 32]);
    let informer = joined_informer(&rng);
    let (_, certificate) = reader_identity("CN=auditor", &rng);

    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), MemoryLedger::new());

    let mut publication = Publication::new();
    publication.build_envelope(&certificate, &rng).unwrap();
    publication.build_content("finding", &rng).unwrap();

    assert!(matches!(
        publication.publish(&mut relay).unwrap_err(),
        PublishError::Incomplete
    ));
    assert!(relay.handle_list().unwrap().is_empty());
}

#[test]
fn ledger_outage_is_a_transient_relay_error() {
    let rng = Rng::from_seed([6; 32]);
    let informer = joined_informer(&rng);
    let (_, certificate) = reader_identity("CN=auditor", &rng);

    let mut ledger = MemoryLedger::new();
    ledger.set_unavailable(true);
    let mut relay: Relay<TestGroupScheme, MemoryLedger> =
        Relay::new(informer.group_key().clone(), ledger);

    let mut publication = Publication::new();
    publication.build_envelope(&certificate, &rng).unwrap();
    publication.build_content("finding", &rng).unwrap();
    publication.sign(&informer, &rng).unwrap();

    let err = publication.publish(&mut relay).unwrap_err();
    assert!(matches!(
        err,
        PublishError::Endpoint(RelayError::Ledger(LedgerError::Unavailable(_)))
    ));
}

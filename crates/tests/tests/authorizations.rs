// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use cv_client::{
    AuthorizationState, CancelToken, ErrorKind, DEFAULT_AUTHORIZATION_DURATION_DAYS,
    SECONDS_PER_DAY,
};
use cv_config::StoreKeys;
use cv_data::{DataStore, Insert, KeyValStore, Remove, SledStore, STORE_TREE};
use cv_devnet::JAR_ADDRESS;
use cv_test_helpers::{
    add_tracing, durable_store, FailingStore, Harness, TestSigner, HARNESS_EPOCH,
};
use serial_test::serial;

const LIFETIME: u64 = DEFAULT_AUTHORIZATION_DURATION_DAYS * SECONDS_PER_DAY;

#[tokio::test]
async fn one_prompt_for_the_whole_validity_window() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(1).await?;

    for step in 0..4 {
        harness.clock.set(HARNESS_EPOCH + step * (LIFETIME / 4));
        client.refresh().await?;
    }
    harness.clock.set(HARNESS_EPOCH + LIFETIME - 1);
    client.refresh().await?;
    assert_eq!(alice.prompts(), 1);
    Ok(())
}

#[tokio::test]
async fn expiry_prompts_again_and_replaces_the_entry() -> Result<()> {
    let _guard = add_tracing("debug");
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(9).await?;
    client.reveal_private().await?;

    harness.clock.set(HARNESS_EPOCH + LIFETIME);
    assert_eq!(
        client.authorizations().state(alice.address(), JAR_ADDRESS),
        AuthorizationState::Expired
    );
    assert_eq!(client.refresh().await?.value, 9);
    assert_eq!(alice.prompts(), 2);

    let stored = client.authorizations().stored()?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].issued_at(), HARNESS_EPOCH + LIFETIME);
    Ok(())
}

#[tokio::test]
async fn declined_prompt_surfaces_and_can_be_retried() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(3).await?;

    alice.reject_next(1);
    let err = client.reveal_private().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SigningRejected);
    assert!(err.needs_reauthorization());
    assert!(client.authorizations().stored()?.is_empty());

    assert_eq!(client.reveal_private().await?.value, 3);
    assert_eq!(alice.prompts(), 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_readers_share_one_prompt() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::gated());
    let client = harness.client(&alice);
    client.submit(7).await?;

    let readers: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.reveal_private().await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    alice.release();

    for reader in readers {
        assert_eq!(reader.await??.value, 7);
    }
    assert_eq!(alice.prompts(), 1);
    Ok(())
}

#[tokio::test]
async fn abandoned_prompt_leaves_nothing_behind() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::gated());
    let client = harness.client(&alice);
    client.submit(7).await?;

    let cancel = CancelToken::new();
    let reader = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { client.reveal_private_with(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    assert_eq!(reader.await?.unwrap_err().kind(), ErrorKind::Cancelled);
    assert!(client.cached().is_none());
    assert_eq!(
        client.authorizations().state(alice.address(), JAR_ADDRESS),
        AuthorizationState::Absent
    );

    alice.release();
    assert_eq!(client.reveal_private().await?.value, 7);
    assert_eq!(alice.prompts(), 2);
    Ok(())
}

#[tokio::test]
async fn unwritable_store_degrades_to_session_only() -> Result<()> {
    let harness = Harness::with_store(FailingStore::data_store());
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(2).await?;

    client.reveal_private().await?;
    client.refresh().await?;
    assert_eq!(alice.prompts(), 1);

    // a new session has nothing to restore
    let restarted = harness.client(&alice);
    restarted.reveal_private().await?;
    assert_eq!(alice.prompts(), 2);
    Ok(())
}

#[tokio::test]
async fn disconnect_clears_everything_for_that_user() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let bob = Arc::new(TestSigner::new());
    let alice_client = harness.client(&alice);
    let bob_client = harness.client(&bob);
    alice_client.submit(1).await?;
    alice_client.reveal_private().await?;
    bob_client.submit(1).await?;
    bob_client.reveal_private().await?;

    assert_eq!(alice_client.disconnect(), Some(alice.address()));
    assert!(alice_client.cached().is_none());
    assert_eq!(
        bob_client.authorizations().state(alice.address(), JAR_ADDRESS),
        AuthorizationState::Absent
    );
    assert_eq!(
        bob_client.authorizations().state(bob.address(), JAR_ADDRESS),
        AuthorizationState::Valid
    );
    Ok(())
}

#[tokio::test]
#[serial]
async fn durable_authorization_survives_restart() -> Result<()> {
    let (_dir, config, store) = durable_store()?;
    let harness = Harness::with_store(store);
    let alice = Arc::new(TestSigner::new());

    let first = harness.client(&alice);
    first.submit(12).await?;
    assert_eq!(first.reveal_private().await?.value, 12);
    drop(first);

    // a new process over the same database starts with an empty memory layer
    let reopened = DataStore::open(&config)?;
    let second = Arc::new(harness.workflow_over(reopened));
    second.connect(alice.clone(), harness.net.ledger_for(alice.address()));
    assert_eq!(second.reveal_private().await?.value, 12);
    assert_eq!(alice.prompts(), 1);

    SledStore::close_all_connections();
    Ok(())
}

#[tokio::test]
#[serial]
async fn durable_record_under_another_user_is_ignored() -> Result<()> {
    let (dir, _config, store) = durable_store()?;
    let harness = Harness::with_store(store.clone());
    let alice = Arc::new(TestSigner::new());
    let mallory = Arc::new(TestSigner::new());

    let mallory_client = harness.client(&mallory);
    mallory_client.submit(1).await?;
    mallory_client.reveal_private().await?;

    // move mallory's record under alice's key
    let raw = SledStore::new(&dir.path().join("db"), STORE_TREE)?;
    let (from, bytes) = store
        .base(StoreKeys::authorizations())
        .entries()?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no stored record"))?;
    raw.remove(Remove::new(from))?;
    raw.insert(Insert::new(
        StoreKeys::authorization(&alice.address(), &JAR_ADDRESS),
        bytes,
    ))?;

    let alice_client = harness.client(&alice);
    alice_client.submit(2).await?;
    assert_eq!(alice_client.reveal_private().await?.value, 3);
    assert_eq!(alice.prompts(), 1);

    SledStore::close_all_connections();
    Ok(())
}

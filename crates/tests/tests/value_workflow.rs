// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::Result;
use cv_client::{ErrorKind, RevealMode};
use cv_devnet::JAR_ADDRESS;
use cv_test_helpers::{add_tracing, Harness, TestSigner};

#[tokio::test]
async fn private_round_trip_of_width_bounds() -> Result<()> {
    let _guard = add_tracing("info");

    for value in [0, 42, u32::MAX as u64] {
        let harness = Harness::new();
        let alice = Arc::new(TestSigner::new());
        let client = harness.client(&alice);

        client.submit(value).await?;
        let revealed = client.reveal_private().await?;
        assert_eq!(revealed.value, value);
        assert_eq!(revealed.mode, RevealMode::Private);
        assert_eq!(revealed.handle, harness.net.jar.encrypted_total()?);
    }
    Ok(())
}

#[tokio::test]
async fn sequential_adds_accumulate() -> Result<()> {
    let _guard = add_tracing("info");
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    client.submit(5).await?;
    assert_eq!(client.reveal_private().await?.value, 5);
    client.submit(3).await?;
    assert_eq!(client.reveal_private().await?.value, 8);

    // one authorization served both reads
    assert_eq!(alice.prompts(), 1);
    assert_eq!(harness.net.jar.submissions(), 2);
    Ok(())
}

#[tokio::test]
async fn read_after_write_never_shows_the_old_value() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    client.submit(5).await?;
    assert_eq!(client.reveal_private().await?.value, 5);
    assert_eq!(client.cached().map(|c| c.value), Some(5));

    client.submit(1).await?;
    assert!(client.cached().is_none());
    assert_eq!(client.refresh().await?.value, 6);
    Ok(())
}

#[tokio::test]
async fn out_of_range_value_is_rejected_locally() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    let err = client.submit(1 << 32).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(harness.net.provider.boots(), 0);
    assert_eq!(harness.net.jar.submissions(), 0);
    Ok(())
}

#[tokio::test]
async fn contributors_read_their_latest_total_only() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let bob = Arc::new(TestSigner::new());
    let alice_client = harness.client(&alice);
    let bob_client = harness.client(&bob);

    alice_client.submit(2).await?;
    bob_client.submit(3).await?;

    assert_eq!(bob_client.reveal_private().await?.value, 5);
    let err = alice_client.reveal_private().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionDenied);

    alice_client.submit(1).await?;
    assert_eq!(alice_client.reveal_private().await?.value, 6);
    // bob moves the total on; alice's displayed value is now behind
    bob_client.submit(1).await?;
    assert!(alice_client.check_staleness().await?);
    Ok(())
}

#[tokio::test]
async fn ledger_outage_is_retryable_and_keeps_the_value() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    client.submit(4).await?;
    let revealed = client.reveal_private().await?;

    harness.net.chain.set_rpc_offline(true);
    let err = client.submit(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ledger);
    assert!(err.is_retryable());
    assert_eq!(client.cached(), Some(revealed));

    harness.net.chain.set_rpc_offline(false);
    client.submit(1).await?;
    assert_eq!(client.reveal_private().await?.value, 5);
    Ok(())
}

#[tokio::test]
async fn nothing_happens_without_a_wallet() -> Result<()> {
    let harness = Harness::new();
    let client = harness.workflow();

    assert_eq!(
        client.submit(1).await.unwrap_err().kind(),
        ErrorKind::WalletUnavailable
    );
    assert_eq!(
        client.reveal_public().await.unwrap_err().kind(),
        ErrorKind::WalletUnavailable
    );
    assert_eq!(harness.net.provider.boots(), 0);
    assert_eq!(harness.net.jar.address(), JAR_ADDRESS);
    Ok(())
}

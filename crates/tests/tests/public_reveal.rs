// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::Result;
use cv_client::{ErrorKind, RevealMode};
use cv_test_helpers::{Harness, TestSigner};

#[tokio::test]
async fn public_decrypt_is_denied_until_published() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(21).await?;

    let instance = client
        .instances()
        .ensure_instance(&harness.net.settings())
        .await?;
    let total = harness.net.jar.encrypted_total()?;
    let err = instance.public_decrypt(total).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionDenied);

    let revealed = client.reveal_public().await?;
    assert_eq!(revealed.value, 21);
    assert_eq!(revealed.mode, RevealMode::Public);
    assert_eq!(instance.public_decrypt(total).await?, 21);
    assert_eq!(harness.net.jar.publications(), 1);
    assert_eq!(alice.prompts(), 0);
    Ok(())
}

#[tokio::test]
async fn anyone_reads_a_published_total() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let outsider = Arc::new(TestSigner::new());
    let alice_client = harness.client(&alice);
    let outsider_client = harness.client(&outsider);

    alice_client.submit(5).await?;
    alice_client.submit(3).await?;
    assert_eq!(alice_client.reveal_public().await?.value, 8);

    // never contributed, cannot decrypt privately, can read the public total
    let err = outsider_client.reveal_private().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionDenied);
    assert_eq!(outsider_client.reveal_public().await?.value, 8);
    assert_eq!(outsider_client.refresh().await?.mode, RevealMode::Public);
    Ok(())
}

#[tokio::test]
async fn new_contribution_is_private_again() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    client.submit(1).await?;
    client.reveal_public().await?;
    let published = harness.net.jar.encrypted_total()?;
    client.submit(1).await?;

    let current = harness.net.jar.encrypted_total()?;
    assert_ne!(current, published);
    assert!(harness.net.chain.is_public(published));
    assert!(!harness.net.chain.is_public(current));

    // the cache was cleared by the write, so refresh goes through the private path
    let refreshed = client.refresh().await?;
    assert_eq!(refreshed.value, 2);
    assert_eq!(refreshed.mode, RevealMode::Private);
    Ok(())
}

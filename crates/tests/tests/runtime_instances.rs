// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use cv_client::{ErrorKind, InstanceStatus};
use cv_test_helpers::{add_tracing, Harness, TestSigner};
use futures::future::join_all;

#[tokio::test]
async fn concurrent_first_use_boots_once() -> Result<()> {
    let _guard = add_tracing("info");
    let harness = Harness::with_boot_delay(Duration::from_millis(50));
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    let results = join_all((1..=10).map(|value| {
        let client = client.clone();
        async move { client.submit(value).await }
    }))
    .await;
    for result in results {
        result?;
    }

    assert_eq!(harness.net.provider.boots(), 1);
    assert_eq!(client.instances().status(), InstanceStatus::Ready);
    assert_eq!(client.reveal_private().await?.value, 55);
    Ok(())
}

#[tokio::test]
async fn failed_boot_is_retryable() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);

    harness.net.provider.fail_next(1);
    let err = client.submit(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    assert!(err.is_retryable());
    assert_eq!(client.instances().status(), InstanceStatus::Uninitialised);

    client.submit(1).await?;
    assert_eq!(harness.net.provider.boots(), 2);
    Ok(())
}

#[tokio::test]
async fn relayer_outage_after_boot_surfaces_as_runtime_error() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(2).await?;

    harness.net.chain.set_relayer_offline(true);
    let err = client.submit(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    let err = client.reveal_private().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);

    harness.net.chain.set_relayer_offline(false);
    assert_eq!(client.reveal_private().await?.value, 2);
    assert_eq!(harness.net.provider.boots(), 1);
    Ok(())
}

#[tokio::test]
async fn reset_then_reboot() -> Result<()> {
    let harness = Harness::new();
    let alice = Arc::new(TestSigner::new());
    let client = harness.client(&alice);
    client.submit(2).await?;
    let first = client.instances().current().map(|i| i.id());

    client.instances().reset();
    assert_eq!(client.instances().status(), InstanceStatus::Uninitialised);
    assert_eq!(client.reveal_private().await?.value, 2);
    assert_ne!(client.instances().current().map(|i| i.id()), first);
    assert_eq!(harness.net.provider.boots(), 2);
    Ok(())
}

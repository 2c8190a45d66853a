#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use nix::sys::signal::Signal;

#[tokio::test]
async fn sighup_is_relayed_to_the_child() {
    let (code, terminals) = common::relay_to_sleeping_child(Signal::SIGHUP).await;

    assert_eq!(code, 128 + 1);
    assert_eq!(terminals, 2);
}

use std::net::SocketAddr;
use std::time::Duration;

use palisade::server::registry::Registry;

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

#[test]
fn test_add_and_lookup() {
    let mut reg = Registry::new();

    let id = reg.add(addr(5000), addr(80));
    let client = reg.lookup(id).unwrap();

    assert_eq!(client.id, id);
    assert_eq!(client.peer, addr(5000));
    assert_eq!(client.local, addr(80));
    assert!(client.accepted.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_ids_are_unique() {
    let mut reg = Registry::new();

    let a = reg.add(addr(5000), addr(80));
    let b = reg.add(addr(5001), addr(80));

    assert_ne!(a, b);
    assert_eq!(reg.len(), 2);
}

#[test]
fn test_remove_is_idempotent() {
    let mut reg = Registry::new();
    let id = reg.add(addr(5000), addr(80));

    assert!(reg.remove(id));
    assert!(!reg.remove(id));
    assert!(reg.lookup(id).is_none());
    assert!(reg.is_empty());
}

#[test]
fn test_lookup_unknown_id() {
    let reg = Registry::new();
    assert!(reg.lookup(7).is_none());
}

#[tokio::test]
async fn test_shutdown_aborts_the_connection_task() {
    let mut reg = Registry::new();
    let id = reg.add(addr(5000), addr(80));

    let task = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    reg.attach(id, task.abort_handle());

    reg.shutdown(id);

    let err = task.await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(reg.lookup(id).is_none());
}

#[tokio::test]
async fn test_shutdown_all_sweeps_every_client() {
    let mut reg = Registry::new();
    let a = reg.add(addr(5000), addr(80));
    let b = reg.add(addr(5001), addr(80));

    let t1 = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    let t2 = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    reg.attach(a, t1.abort_handle());
    reg.attach(b, t2.abort_handle());

    reg.shutdown_all();

    assert!(reg.is_empty());
    assert!(t1.await.unwrap_err().is_cancelled());
    assert!(t2.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_attach_after_task_finished_is_harmless() {
    let mut reg = Registry::new();
    let id = reg.add(addr(5000), addr(80));

    let task = tokio::spawn(async {});
    task.abort_handle().abort();

    // the task already detached itself in the meantime
    reg.remove(id);
    reg.attach(id, tokio::spawn(async {}).abort_handle());

    assert!(reg.lookup(id).is_none());
}

#[test]
fn test_shutdown_of_unknown_client_is_a_no_op() {
    let mut reg = Registry::new();
    reg.shutdown(99);
    assert!(reg.is_empty());
}

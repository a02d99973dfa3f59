//! List paging tests for the in-memory task store.

use super::helpers::{cancel, prepare, seed, store};
use rstest::rstest;
use task_service::task::{adapters::memory::InMemoryTaskStore, ports::TaskStore};
use tokio_util::sync::CancellationToken;

#[rstest]
#[case(25, 0, 10, Some(1))]
#[case(5, 0, 5, Some(1))]
#[case(10, 5, 5, Some(6))]
#[case(10, 10, 0, None)]
#[case(0, 0, 0, None)]
#[case(3, 9, 1, Some(10))]
#[case(u64::MAX, u64::MAX, 0, None)]
#[tokio::test(flavor = "multi_thread")]
async fn pages_ten_tasks_by_ascending_id(
    store: InMemoryTaskStore,
    cancel: CancellationToken,
    #[case] limit: u64,
    #[case] offset: u64,
    #[case] expected_len: usize,
    #[case] first_id: Option<u64>,
) {
    prepare(&store).await.expect("store prepared");
    seed(&store, &cancel, 10).await.expect("tasks seeded");

    let page = store
        .list(&cancel, limit, offset)
        .await
        .expect("list succeeds");

    assert_eq!(page.len(), expected_len);
    assert_eq!(page.first().map(|task| task.id().value()), first_id);
    let ids: Vec<u64> = page.iter().map(|task| task.id().value()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_table_lists_nothing(store: InMemoryTaskStore, cancel: CancellationToken) {
    prepare(&store).await.expect("store prepared");

    let page = store.list(&cancel, 25, 0).await.expect("list succeeds");

    assert!(page.is_empty());
}

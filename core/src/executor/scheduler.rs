use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::error::ExecutorError;

use super::engine::TaskExecutor;
use super::types::Task;

/// Fan out `descriptions` over independent executors.
///
/// Instructions are dealt round-robin into one queue per executor. Each
/// queue runs sequentially on its own executor while all queues run
/// concurrently. `on_complete` sees every task as it reaches a terminal
/// status, tagged with its input index; completion order across executors
/// is unspecified.
///
/// # Returns
///
/// The finished tasks in input order.
pub async fn execute_partitioned<S, F>(
    descriptions: &[S],
    executors: &[TaskExecutor],
    timeout: Option<Duration>,
    on_complete: F,
) -> Result<Vec<Task>, ExecutorError>
where
    S: AsRef<str>,
    F: Fn(usize, &Task),
{
    if descriptions.is_empty() {
        return Ok(Vec::new());
    }
    if executors.is_empty() {
        return Err(ExecutorError::NoExecutors);
    }

    let mut queues: Vec<Vec<usize>> = vec![Vec::new(); executors.len()];
    for index in 0..descriptions.len() {
        queues[index % executors.len()].push(index);
    }

    let on_complete = &on_complete;
    let mut futs: FuturesUnordered<_> = executors
        .iter()
        .zip(queues)
        .filter(|(_, queue)| !queue.is_empty())
        .map(|(executor, queue)| async move {
            let mut finished = Vec::with_capacity(queue.len());
            for index in queue {
                let task = executor
                    .execute(descriptions[index].as_ref(), timeout)
                    .await?;
                on_complete(index, &task);
                finished.push((index, task));
            }
            Ok::<_, ExecutorError>(finished)
        })
        .collect();

    let mut slots: Vec<Option<Task>> = vec![None; descriptions.len()];
    while let Some(res) = futs.next().await {
        for (index, task) in res? {
            slots[index] = Some(task);
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

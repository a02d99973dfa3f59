//! Given steps for task service BDD scenarios.

use super::world::{MIGRATIONS, TaskServiceWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use task_service::task::{
    domain::Task,
    ports::{SchemaChange, TaskStore},
};

#[given("an open task store with the schema applied")]
fn open_store(world: &mut TaskServiceWorld) -> Result<(), eyre::Report> {
    run_async(world.store.open("memory")).wrap_err("open in-memory store")?;
    run_async(world.store.prepare(SchemaChange::Up, MIGRATIONS)).wrap_err("apply schema")?;
    Ok(())
}

#[given("{count:u64} tasks have been created")]
fn tasks_created(world: &mut TaskServiceWorld, count: u64) -> Result<(), eyre::Report> {
    for index in 1..=count {
        let mut task = Task::new(format!("Task {index}"));
        run_async(world.service.create(&world.cancel, &mut task))
            .wrap_err_with(|| format!("create task {index}"))?;
    }
    Ok(())
}

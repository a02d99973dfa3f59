//! When steps for task service BDD scenarios.

use super::world::{TaskServiceWorld, run_async};
use rstest_bdd_macros::when;
use task_service::task::domain::{Task, TaskId};

fn create(world: &mut TaskServiceWorld, mut task: Task) {
    let result = run_async(world.service.create(&world.cancel, &mut task));
    world.last_task = Some(task);
    world.last_write = Some(result);
}

#[when(r#"a task named "{name}" is created with details "{details}""#)]
fn create_with_details(world: &mut TaskServiceWorld, name: String, details: String) {
    create(world, Task::new(name).with_details(details));
}

#[when(r#"a task named "{name}" is created"#)]
fn create_named(world: &mut TaskServiceWorld, name: String) {
    create(world, Task::new(name));
}

#[when(r#"a task with id {id:u64} named "{name}" is created"#)]
fn create_with_id(world: &mut TaskServiceWorld, id: u64, name: String) {
    create(world, Task::with_id(TaskId::new(id), name));
}

#[when(r#"task {id:u64} is renamed to "{name}""#)]
fn rename(world: &mut TaskServiceWorld, id: u64, name: String) {
    let mut task = Task::with_id(TaskId::new(id), name);
    let result = run_async(world.service.update(&world.cancel, &mut task));
    world.last_task = Some(task);
    world.last_write = Some(result);
}

#[when("task {id:u64} is deleted")]
fn delete(world: &mut TaskServiceWorld, id: u64) {
    world.last_removal = Some(run_async(
        world.service.delete(&world.cancel, TaskId::new(id)),
    ));
}

#[when("the service is shut down")]
fn shut_down(world: &mut TaskServiceWorld) {
    world.last_shutdown = Some(run_async(world.service.shutdown()));
}

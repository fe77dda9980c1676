use std::cell::RefCell;
use std::rc::Rc;

use airpaint_core::Teardown;

fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let make = {
        let log = Rc::clone(&log);
        move |label: &'static str| -> Box<dyn FnOnce()> {
            let log = Rc::clone(&log);
            Box::new(move || log.borrow_mut().push(label))
        }
    };
    (log, make)
}

#[test]
fn runs_steps_in_reverse_acquisition_order() {
    let (log, step) = recorder();
    let mut teardown = Teardown::new();
    for label in ["surface", "textures", "uniforms", "scheduler"] {
        teardown.push(label, step(label));
    }

    teardown.run();

    assert_eq!(*log.borrow(), vec!["scheduler", "uniforms", "textures", "surface"]);
}

#[test]
fn second_run_releases_nothing() {
    let (log, step) = recorder();
    let mut teardown = Teardown::new();
    teardown.push("textures", step("textures"));

    teardown.run();
    teardown.run();

    assert_eq!(log.borrow().len(), 1);
    assert!(teardown.is_completed());
    assert!(teardown.is_empty());
}

#[test]
fn drop_runs_pending_steps() {
    let (log, step) = recorder();
    {
        let mut teardown = Teardown::new();
        teardown.push("a", step("a"));
        teardown.push("b", step("b"));
    }
    assert_eq!(*log.borrow(), vec!["b", "a"]);
}

#[test]
fn step_pushed_after_teardown_runs_immediately() {
    let (log, step) = recorder();
    let mut teardown = Teardown::new();
    teardown.run();

    teardown.push("late", step("late"));

    assert_eq!(*log.borrow(), vec!["late"]);
    assert!(teardown.is_empty());
}

#[test]
fn labels_list_pending_steps_in_release_order() {
    let mut teardown = Teardown::new();
    for label in ["surface", "textures", "scheduler"] {
        teardown.push(label, || {});
    }
    assert_eq!(teardown.labels(), vec!["scheduler", "textures", "surface"]);

    teardown.run();
    assert!(teardown.labels().is_empty());
}

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use airpaint_core::{
    CanvasSize, Field, Parity, PipelineError, ResourceManager, Store, TextureFactory,
};

#[derive(Debug, Clone, PartialEq)]
struct MockTexture {
    id: u32,
    field: Field,
    slot: Parity,
    size: CanvasSize,
}

#[derive(Default)]
struct FactoryLog {
    next_id: Cell<u32>,
    live: RefCell<Vec<u32>>,
    released: RefCell<Vec<u32>>,
    cleared: RefCell<Vec<u32>>,
    fail_on: Cell<Option<u32>>,
}

impl FactoryLog {
    fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}

/// Factory that tracks live textures and can fail on the nth creation
#[derive(Clone, Default)]
struct MockFactory(Rc<FactoryLog>);

impl std::ops::Deref for MockFactory {
    type Target = FactoryLog;

    fn deref(&self) -> &FactoryLog {
        &self.0
    }
}

impl TextureFactory for MockFactory {
    type Texture = MockTexture;

    fn create(&self, field: Field, slot: Parity, size: CanvasSize) -> Result<MockTexture, PipelineError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if self.fail_on.get() == Some(id) {
            return Err(PipelineError::exhausted(field.label(slot), "mock out of memory"));
        }
        self.live.borrow_mut().push(id);
        Ok(MockTexture { id, field, slot, size })
    }

    fn clear(&self, texture: &MockTexture) {
        self.cleared.borrow_mut().push(texture.id);
    }

    fn release(&self, texture: MockTexture) {
        let mut live = self.live.borrow_mut();
        let position = live.iter().position(|id| *id == texture.id);
        assert!(position.is_some(), "texture {} released twice", texture.id);
        if let Some(position) = position {
            live.remove(position);
        }
        self.released.borrow_mut().push(texture.id);
    }
}

fn manager(size: CanvasSize) -> (MockFactory, ResourceManager<MockFactory>) {
    let factory = MockFactory::default();
    let manager = ResourceManager::new(factory.clone(), size).expect("initial allocation");
    (factory, manager)
}

#[test]
fn allocates_two_pairs_at_canvas_size() {
    let size = CanvasSize::new(800, 600);
    let (factory, manager) = manager(size);
    let pairs = manager.pairs_for(size).expect("pairs");

    assert_eq!(factory.live_count(), 4);
    assert!(pairs.iter().all(|texture| texture.size == size));
    assert_eq!(pairs.pigment(Parity::Even).field, Field::Pigment);
    assert_eq!(pairs.pigment(Parity::Odd).slot, Parity::Odd);
    assert_eq!(pairs.water(Parity::Even).field, Field::Water);
    assert_eq!(pairs.water(Parity::Odd).slot, Parity::Odd);
}

#[test]
fn resize_replaces_all_four_textures() {
    let (factory, mut manager) = manager(CanvasSize::new(800, 600));
    let smaller = CanvasSize::new(400, 300);

    manager.reallocate(smaller).expect("reallocate");

    assert_eq!(*factory.released.borrow(), vec![0, 1, 2, 3]);
    assert_eq!(*factory.live.borrow(), vec![4, 5, 6, 7]);
    let pairs = manager.pairs_for(smaller).expect("pairs");
    assert!(pairs.iter().all(|texture| texture.size == smaller));
    assert_eq!(manager.generation(), 2);
}

#[test]
fn resize_to_same_size_keeps_textures() {
    let size = CanvasSize::new(64, 64);
    let (factory, mut manager) = manager(size);

    manager.reallocate(size).expect("reallocate");

    assert!(factory.released.borrow().is_empty());
    assert_eq!(manager.generation(), 1);
}

#[test]
fn failed_reallocation_keeps_previous_set() {
    let size = CanvasSize::new(800, 600);
    let (factory, mut manager) = manager(size);
    // Third texture of the replacement set fails
    factory.fail_on.set(Some(6));

    let err = manager.reallocate(CanvasSize::new(400, 300)).unwrap_err();

    assert!(matches!(err, PipelineError::ResourceExhausted { .. }));
    assert!(err.is_fatal());
    assert_eq!(*factory.released.borrow(), vec![4, 5]);
    assert_eq!(*factory.live.borrow(), vec![0, 1, 2, 3]);
    assert!(manager.pairs_for(size).is_ok());
}

#[test]
fn failed_initial_allocation_leaves_nothing_alive() {
    let factory = MockFactory::default();
    factory.fail_on.set(Some(3));

    let result = ResourceManager::new(factory.clone(), CanvasSize::new(32, 32));

    assert!(result.is_err());
    assert_eq!(factory.live_count(), 0);
}

#[test]
fn stale_size_is_reported_not_served() {
    let (_factory, manager) = manager(CanvasSize::new(800, 600));

    let err = manager.pairs_for(CanvasSize::new(400, 300)).err();

    match err {
        Some(PipelineError::StaleResourceReference {
            expected_width,
            expected_height,
            found_width,
            found_height,
        }) => {
            assert_eq!((expected_width, expected_height), (400, 300));
            assert_eq!((found_width, found_height), (800, 600));
        }
        other => panic!("expected stale reference, got {:?}", other),
    }
}

#[test]
fn size_subscription_reallocates_before_next_frame() {
    let size = Store::new(CanvasSize::new(800, 600));
    let (factory, manager) = manager(size.read());
    let manager = Rc::new(RefCell::new(manager));

    let _subscription = size.subscribe({
        let manager = Rc::clone(&manager);
        move |next: &CanvasSize| manager.borrow_mut().handle_resize(*next)
    });

    for next in [CanvasSize::new(400, 300), CanvasSize::new(1024, 768), CanvasSize::new(1, 1)] {
        size.write(next);
        assert!(manager.borrow().pairs_for(size.read()).is_ok());
        assert_eq!(factory.live_count(), 4);
    }
}

#[test]
fn subscription_failure_is_recorded_as_fault() {
    let (factory, mut manager) = manager(CanvasSize::new(16, 16));
    factory.fail_on.set(Some(4));

    manager.handle_resize(CanvasSize::new(32, 32));

    assert!(matches!(manager.fault(), Some(PipelineError::ResourceExhausted { .. })));
}

#[test]
fn clear_touches_every_texture_without_reallocating() {
    let (factory, manager) = manager(CanvasSize::new(8, 8));

    manager.clear();

    assert_eq!(*factory.cleared.borrow(), vec![0, 1, 2, 3]);
    assert!(factory.released.borrow().is_empty());
}

#[test]
fn release_is_idempotent() {
    let (factory, mut manager) = manager(CanvasSize::new(8, 8));

    manager.release();
    manager.release();

    assert_eq!(factory.released.borrow().len(), 4);
    assert!(manager.pairs().is_none());
    assert!(manager.pairs_for(CanvasSize::new(8, 8)).is_err());
}

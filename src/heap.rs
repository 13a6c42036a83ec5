use crate::value::{Class, Instance};

pub type HeapId = usize;

enum HeapData {
    Str(String),
    Class(Class),
    Instance(Instance),
}

/// Append-only arena for heap-resident runtime objects. Handles stay valid
/// for the lifetime of the interpreter; everything is released wholesale
/// when the arena is dropped, so instance graphs may contain cycles.
#[derive(Default)]
pub struct Heap {
    values: Vec<HeapData>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    pub fn manage_str(&mut self, text: String) -> HeapId {
        self.push(HeapData::Str(text))
    }

    pub fn manage_class(&mut self, class: Class) -> HeapId {
        self.push(HeapData::Class(class))
    }

    pub fn manage_instance(&mut self, instance: Instance) -> HeapId {
        self.push(HeapData::Instance(instance))
    }

    fn push(&mut self, data: HeapData) -> HeapId {
        self.values.push(data);
        self.values.len() - 1
    }

    pub fn get_str(&self, id: HeapId) -> &str {
        match &self.values[id] {
            HeapData::Str(text) => text,
            _ => panic!("Internal interpreter error: heap id {} is not a string.", id),
        }
    }

    pub fn get_class(&self, id: HeapId) -> &Class {
        match &self.values[id] {
            HeapData::Class(class) => class,
            _ => panic!("Internal interpreter error: heap id {} is not a class.", id),
        }
    }

    pub fn get_instance(&self, id: HeapId) -> &Instance {
        match &self.values[id] {
            HeapData::Instance(instance) => instance,
            _ => panic!(
                "Internal interpreter error: heap id {} is not an instance.",
                id
            ),
        }
    }

    pub fn get_instance_mut(&mut self, id: HeapId) -> &mut Instance {
        match &mut self.values[id] {
            HeapData::Instance(instance) => instance,
            _ => panic!(
                "Internal interpreter error: heap id {} is not an instance.",
                id
            ),
        }
    }
}

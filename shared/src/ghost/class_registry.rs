use ghostwire_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::ghost::{error::GhostError, replicable::Replicable};

/// Stable wire tag identifying one registered object class.
///
/// Tags are assigned in registration order, so both endpoints must
/// register the same classes in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassTag(u16);

impl ClassTag {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Serde for ClassTag {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<4>::new(self.0).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = UnsignedVariableInteger::<4>::de(reader)?.get();
        if value > u16::MAX as u64 {
            return Err(SerdeErr::ValueOutOfRange);
        }
        Ok(Self(value as u16))
    }

    fn bit_length(&self) -> u32 {
        UnsignedVariableInteger::<4>::new(self.0).bit_length()
    }
}

type Builder = Box<dyn Fn() -> Box<dyn Replicable> + Send + Sync>;

/// Maps wire class tags to constructors, so the receiving endpoint can
/// materialize a concrete proxy type it only learns about from packet
/// data.
pub struct ClassRegistry {
    builders: Vec<Builder>,
    names: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            builders: Vec::new(),
            names: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, builder: F) -> ClassTag
    where
        F: Fn() -> Box<dyn Replicable> + Send + Sync + 'static,
    {
        debug_assert!(
            self.builders.len() < u16::MAX as usize,
            "class registry full"
        );
        let tag = ClassTag(self.builders.len() as u16);
        self.builders.push(Box::new(builder));
        self.names.push(name.to_string());
        tag
    }

    pub fn create(&self, tag: ClassTag) -> Result<Box<dyn Replicable>, GhostError> {
        let builder = self
            .builders
            .get(tag.0 as usize)
            .ok_or(GhostError::UnknownClassTag { tag: tag.0 })?;
        Ok(builder())
    }

    pub fn name(&self, tag: ClassTag) -> Option<&str> {
        self.names.get(tag.0 as usize).map(String::as_str)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

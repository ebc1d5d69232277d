//! Array and tuple shapes with memory-space annotations.
//!
//! Only what the estimator needs is modelled: element type, dimensions,
//! the memory space an array lives in, and byte sizes.

use smallvec::SmallVec;
use std::fmt;

/// Memory-space tag carried by array shapes.
///
/// Space `0` is default memory. Which non-zero id denotes the alternate
/// (fast) tier is a property of the estimator, not of the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MemorySpace(pub i64);

impl MemorySpace {
    /// Default (large, slow) memory.
    pub const DEFAULT: MemorySpace = MemorySpace(0);

    /// Returns true for default memory.
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

/// Element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Pred,
    S8,
    U8,
    S32,
    U32,
    F16,
    BF16,
    F32,
    S64,
    F64,
}

impl PrimitiveType {
    /// Size of one element in bytes.
    pub fn byte_width(self) -> u64 {
        match self {
            Self::Pred | Self::S8 | Self::U8 => 1,
            Self::F16 | Self::BF16 => 2,
            Self::S32 | Self::U32 | Self::F32 => 4,
            Self::S64 | Self::F64 => 8,
        }
    }
}

/// Shape of an instruction result.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Dense array.
    Array {
        /// Element type.
        element_type: PrimitiveType,
        /// Dimension sizes, major to minor.
        dims: SmallVec<[u64; 4]>,
        /// Where the array is placed.
        memory_space: MemorySpace,
    },
    /// Tuple of shapes.
    Tuple(Vec<Shape>),
}

impl Shape {
    /// Array in default memory.
    pub fn array(element_type: PrimitiveType, dims: &[u64]) -> Self {
        Shape::Array {
            element_type,
            dims: SmallVec::from_slice(dims),
            memory_space: MemorySpace::DEFAULT,
        }
    }

    /// Rank-0 array in default memory.
    pub fn scalar(element_type: PrimitiveType) -> Self {
        Self::array(element_type, &[])
    }

    /// Tuple of the given element shapes.
    pub fn tuple(elements: Vec<Shape>) -> Self {
        Shape::Tuple(elements)
    }

    /// Same shape placed in `space`. Tuples are returned unchanged.
    pub fn in_memory_space(mut self, space: MemorySpace) -> Self {
        if let Shape::Array { memory_space, .. } = &mut self {
            *memory_space = space;
        }
        self
    }

    /// Memory space of an array shape; tuples have none.
    pub fn memory_space(&self) -> Option<MemorySpace> {
        match self {
            Shape::Array { memory_space, .. } => Some(*memory_space),
            Shape::Tuple(_) => None,
        }
    }

    /// Dimensions of an array shape (empty for tuples and scalars).
    pub fn dims(&self) -> &[u64] {
        match self {
            Shape::Array { dims, .. } => dims,
            Shape::Tuple(_) => &[],
        }
    }

    /// Number of array elements. Tuples count as zero elements.
    pub fn element_count(&self) -> u64 {
        match self {
            Shape::Array { dims, .. } => dims.iter().product(),
            Shape::Tuple(_) => 0,
        }
    }

    /// Byte size of the top-level buffer.
    ///
    /// A tuple occupies one pointer per element; its elements are separate
    /// buffers and are not included.
    pub fn byte_size(&self, pointer_size: u64) -> u64 {
        match self {
            Shape::Array { element_type, .. } => self.element_count() * element_type.byte_width(),
            Shape::Tuple(elements) => elements.len() as u64 * pointer_size,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Array { element_type, dims, memory_space } => {
                write!(f, "{:?}[", element_type)?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", d)?;
                }
                write!(f, "]")?;
                if !memory_space.is_default() {
                    write!(f, "{{S({})}}", memory_space.0)?;
                }
                Ok(())
            }
            Shape::Tuple(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_byte_size() {
        let shape = Shape::array(PrimitiveType::F32, &[128]);
        assert_eq!(shape.element_count(), 128);
        assert_eq!(shape.byte_size(8), 512);
    }

    #[test]
    fn test_scalar_has_one_element() {
        let shape = Shape::scalar(PrimitiveType::S32);
        assert_eq!(shape.element_count(), 1);
        assert_eq!(shape.byte_size(8), 4);
    }

    #[test]
    fn test_tuple_is_pointer_table() {
        let shape = Shape::tuple(vec![
            Shape::array(PrimitiveType::F32, &[1024]),
            Shape::scalar(PrimitiveType::U32),
        ]);
        assert_eq!(shape.byte_size(8), 16);
        assert_eq!(shape.memory_space(), None);
    }

    #[test]
    fn test_memory_space_annotation() {
        let shape = Shape::array(PrimitiveType::F32, &[32]).in_memory_space(MemorySpace(1));
        assert_eq!(shape.memory_space(), Some(MemorySpace(1)));
        assert_eq!(shape.to_string(), "F32[32]{S(1)}");
        assert_eq!(Shape::array(PrimitiveType::F32, &[2, 3]).to_string(), "F32[2,3]");
    }
}

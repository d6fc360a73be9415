//! Rectangular multi-dimensional arrays.

use crate::descriptor::{TypeInfo, TypeKind};
use crate::error::{GraphcodeError, Result};
use crate::graph::{GraphReader, GraphWriter};
use crate::object::GraphType;

/// Largest rank the wire format can describe.
pub const MAX_RANK: usize = u8::MAX as usize;

/// A dense array with a fixed rank and a length per dimension, stored in row-major order.
///
/// ```rust
/// use graphcode::RectArray;
///
/// let grid = RectArray::from_fn(vec![2, 3], |idx| (idx[0] * 3 + idx[1]) as i32)?;
/// assert_eq!(grid.get(&[1, 2]), Some(&5));
/// assert_eq!(grid.dims(), &[2, 3]);
/// # Ok::<(), graphcode::GraphcodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RectArray<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

fn element_count(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(GraphcodeError::InvalidShape("rank must be at least 1".into()));
    }
    if dims.len() > MAX_RANK {
        return Err(GraphcodeError::RankOverflow(dims.len()));
    }
    dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d)).ok_or_else(|| {
        GraphcodeError::InvalidShape(format!("element count of {dims:?} overflows"))
    })
}

impl<T> RectArray<T> {
    /// Wraps row-major `data` with the given dimensions.
    pub fn new(dims: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected = element_count(&dims)?;
        if expected != data.len() {
            return Err(GraphcodeError::InvalidShape(format!(
                "{dims:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Builds an array by calling `f` with every index in row-major order.
    pub fn from_fn(dims: Vec<usize>, mut f: impl FnMut(&[usize]) -> T) -> Result<Self> {
        let total = element_count(&dims)?;
        let mut data = Vec::with_capacity(total);
        let mut indices = Odometer::new(&dims);
        while let Some(index) = indices.next_index() {
            data.push(f(index));
        }
        Ok(Self { dims, data })
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Length of every dimension.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (i, d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            offset = offset * d + i;
        }
        Some(offset)
    }

    /// Element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).and_then(|o| self.data.get(o))
    }

    /// Mutable element at a multi-dimensional index.
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        self.offset(index).and_then(|o| self.data.get_mut(o))
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterates over elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Consumes the array, returning its dimensions and row-major data.
    pub fn into_parts(self) -> (Vec<usize>, Vec<T>) {
        (self.dims, self.data)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Progress {
    Fresh,
    Running,
    Done,
}

/// Multi-counter over every index of a shape, last dimension fastest.
struct Odometer<'d> {
    dims: &'d [usize],
    current: Vec<usize>,
    progress: Progress,
}

impl<'d> Odometer<'d> {
    fn new(dims: &'d [usize]) -> Self {
        Self {
            dims,
            current: vec![0; dims.len()],
            progress: Progress::Fresh,
        }
    }

    fn next_index(&mut self) -> Option<&[usize]> {
        match self.progress {
            Progress::Done => None,
            Progress::Fresh => {
                if self.dims.iter().any(|d| *d == 0) {
                    self.progress = Progress::Done;
                    return None;
                }
                self.progress = Progress::Running;
                Some(&self.current)
            }
            Progress::Running => {
                for axis in (0..self.dims.len()).rev() {
                    self.current[axis] += 1;
                    if self.current[axis] < self.dims[axis] {
                        return Some(&self.current);
                    }
                    self.current[axis] = 0;
                }
                self.progress = Progress::Done;
                None
            }
        }
    }
}

impl<T: GraphType> GraphType for RectArray<T> {
    const KIND: TypeKind = TypeKind::RectArray;

    fn type_name() -> String {
        format!("RectArray<{}>", T::type_name())
    }

    fn type_info() -> TypeInfo {
        TypeInfo::new(Self::type_name(), Self::KIND).field::<T>("item")
    }

    fn encode(&self, w: &mut GraphWriter<'_>) -> Result<()> {
        let rank = u8::try_from(self.rank()).map_err(|_| GraphcodeError::RankOverflow(self.rank()))?;
        w.wire().write_u8(rank);
        for d in &self.dims {
            w.wire().write_len(*d)?;
        }
        let mut indices = Odometer::new(&self.dims);
        while let Some(index) = indices.next_index() {
            let item = self.get(index).ok_or_else(|| {
                GraphcodeError::Internal(format!("index {index:?} outside {:?}", self.dims))
            })?;
            item.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut GraphReader<'_>) -> Result<Self> {
        let rank = usize::from(r.wire().read_u8()?);
        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(r.wire().read_len()?);
        }
        let total = element_count(&dims)
            .map_err(|e| GraphcodeError::FormatCorruption(e.to_string()))?;
        let mut data = Vec::with_capacity(r.capacity_hint(total));
        r.read_items(total, |r| {
            data.push(T::decode(r)?);
            Ok(())
        })?;
        Ok(Self { dims, data })
    }
}

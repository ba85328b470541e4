//! Builders projecting planned operations into an output variant.
pub mod arm;
pub mod swagger;

use crate::operation::OperationShape;

/// Trait for converting an [`OperationShape`] into a variant-specific fragment.
///
/// `previous` is the fragment emitted immediately before this one in the whole
/// run, which lets a builder chain fragments together.
pub trait OperationBuilder {
    type Fragment;

    fn build(&self, shape: &OperationShape, previous: Option<&Self::Fragment>) -> Self::Fragment;
}

/// Build every shape in order, threading the last fragment through as a fold
pub fn build_all<B, I>(builder: &B, shapes: I) -> Vec<B::Fragment>
where
    B: OperationBuilder + ?Sized,
    I: IntoIterator<Item = OperationShape>,
{
    shapes.into_iter().fold(Vec::new(), |mut fragments, shape| {
        let fragment = builder.build(&shape, fragments.last());
        fragments.push(fragment);
        fragments
    })
}

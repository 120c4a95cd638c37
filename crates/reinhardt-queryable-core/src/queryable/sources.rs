//! Type-level lists of query sources
//!
//! A queryable's sources are a tuple of models, `(A,)` up to
//! `(A, B, C, D, E, F, G)`. Joining appends one model ([`Append`]), and
//! [`HasSource`] proves at compile time that a model is part of the list.
//! Its index parameter is inferred whenever the model appears once; a
//! self-join names the position explicitly (`I0`, `I1`, ...).

use crate::model::{Model, ModelType};

/// An ordered, statically sized list of source models
pub trait SourceList: Send + Sync + 'static {
	const ARITY: usize;

	/// The model the query was started from
	type Primary: Model;

	fn model_types() -> Vec<ModelType>;
}

/// Position markers for [`HasSource`]
pub struct I0;
pub struct I1;
pub struct I2;
pub struct I3;
pub struct I4;
pub struct I5;
pub struct I6;

/// `M` is the source at position `I`
pub trait HasSource<M, I> {}

/// The source list after joining `N`
pub trait Append<N> {
	type Output: SourceList;
}

macro_rules! impl_source_list {
	(@has $all:tt $($name:ident : $idx:ident),+) => {
		$(impl_source_list!(@one $all $name $idx);)+
	};
	(@one [$($all:ident),+] $name:ident $idx:ident) => {
		impl<$($all),+> HasSource<$name, $idx> for ($($all,)+) {}
	};
	($arity:literal; $first:ident : $first_idx:ident $(, $name:ident : $idx:ident)*) => {
		impl<$first: Model $(, $name: Model)*> SourceList for ($first, $($name,)*) {
			const ARITY: usize = $arity;
			type Primary = $first;

			fn model_types() -> Vec<ModelType> {
				vec![ModelType::of::<$first>() $(, ModelType::of::<$name>())*]
			}
		}

		impl_source_list!(@has [$first $(, $name)*] $first : $first_idx $(, $name : $idx)*);
	};
}

impl_source_list!(1; A: I0);
impl_source_list!(2; A: I0, B: I1);
impl_source_list!(3; A: I0, B: I1, C: I2);
impl_source_list!(4; A: I0, B: I1, C: I2, D: I3);
impl_source_list!(5; A: I0, B: I1, C: I2, D: I3, E: I4);
impl_source_list!(6; A: I0, B: I1, C: I2, D: I3, E: I4, F: I5);
impl_source_list!(7; A: I0, B: I1, C: I2, D: I3, E: I4, F: I5, G: I6);

macro_rules! impl_append {
	($($name:ident),+) => {
		impl<$($name: Model,)+ Next: Model> Append<Next> for ($($name,)+) {
			type Output = ($($name,)+ Next);
		}
	};
}

impl_append!(A);
impl_append!(A, B);
impl_append!(A, B, C);
impl_append!(A, B, C, D);
impl_append!(A, B, C, D, E);
impl_append!(A, B, C, D, E, F);

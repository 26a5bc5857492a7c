pub use enclose::*;

#[macro_export]
macro_rules! deps {
	($($source:expr),* $(,)?) => {
		vec![$($crate::Listenable::from(&$source)),*]
	};
}

#[macro_export]
macro_rules! computed {
	(( $($d_tt:tt)* ) [$($dep:expr),* $(,)?] => $($b:tt)*) => {
		$crate::Computed::new(
			$crate::deps![$($dep),*],
			$crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }),
		)
	};
	([$($dep:expr),* $(,)?] => $($b:tt)*) => {
		$crate::Computed::new($crate::deps![$($dep),*], move || { $($b)* })
	};
}

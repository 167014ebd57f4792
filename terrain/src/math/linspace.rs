use num_traits::{AsPrimitive, Float};

/// Returns `n` evenly spaced values from `y_start` to `y_end`,
/// inclusive. The last value is exactly `y_end`.
pub fn linspace<T>(y_start: T, y_end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + 'static,
    usize: AsPrimitive<T>,
{
    let dy = if n > 1 {
        (y_end - y_start) / (n - 1).as_()
    } else {
        T::zero()
    };
    (0..n).map(move |x| {
        if n > 1 && x == n - 1 {
            y_end
        } else {
            y_start + x.as_() * dy
        }
    })
}

use crate::image::Stack;

/// Mean intensity of `pixels` in every frame. An empty pixel set yields NaN
/// for every frame.
pub fn mean_trace<I>(stack: &Stack, pixels: I) -> Vec<f64>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut sums = vec![0.0f64; stack.frames];
    let mut count = 0usize;
    for (x, y) in pixels {
        for (acc, &v) in sums.iter_mut().zip(stack.series(x, y)) {
            *acc += v as f64;
        }
        count += 1;
    }
    if count == 0 {
        return vec![f64::NAN; stack.frames];
    }
    let n = count as f64;
    sums.iter_mut().for_each(|s| *s /= n);
    sums
}

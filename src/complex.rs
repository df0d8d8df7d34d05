use num::complex::Complex;

pub type C<T> = Complex<T>;

pub fn c(re: f64, im: f64) -> C<f64> {
    Complex::new(re, im)
}

pub fn is_finite(z: &C<f64>) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

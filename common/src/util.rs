use std::io::Write;

use eyre::Result;

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub fn sample_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    (data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64).sqrt()
}

pub fn standard_error(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sample_std_dev(data) / (data.len() as f64).sqrt()
}

/// Half-width of the normal-approximation 95% interval around the mean,
/// the band the error bars span.
pub fn interval_half_width(data: &[f64]) -> f64 {
    1.96 * standard_error(data)
}

pub fn write_csv<W: Write>(out: W, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn mean_of_samples() {
        assert!(close(mean(&[1.0, 2.0, 3.0]), 2.0));
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn sample_std_dev_uses_bessel_correction() {
        assert!(close(sample_std_dev(&[1.0, 2.0, 3.0]), 1.0));
        assert_eq!(sample_std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn interval_half_width_scales_standard_error() {
        let data = [1.0, 2.0, 3.0];
        assert!(close(
            interval_half_width(&data),
            1.96 / 3.0f64.sqrt()
        ));
        assert_eq!(interval_half_width(&[]), 0.0);
    }

    #[test]
    fn constant_samples_have_no_interval() {
        assert_eq!(interval_half_width(&[4.0, 4.0, 4.0]), 0.0);
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_csv(
            &mut out,
            &["variant".to_owned(), "threads".to_owned()],
            &[vec!["lock-free".to_owned(), "1".to_owned()]],
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "variant,threads\nlock-free,1\n"
        );
    }
}

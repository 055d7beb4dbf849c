use analysis_core::PivotPoints;

/// Simple Moving Average.
///
/// Positions before `period - 1` are undefined, so the output is shorter
/// than the input by `period - 1` rather than zero-padded.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, smoothing factor k = 2 / (period + 1).
///
/// Seeded with the first observation, so every position has a value and the
/// output length equals the input length.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push(data[i] * k + prev * (1.0 - k));
    }
    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    // A flat or monotonically rising window has no average loss; the
    // indicator is defined as 100 there instead of dividing by zero.
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Relative Strength Index with Wilder's smoothing (alpha = 1/period).
///
/// The first value averages the first `period` deltas; positions before the
/// warm-up are absent.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(gains.len() - period + 1);
    result.push(rsi_value(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        result.push(rsi_value(avg_gain, avg_loss));
    }
    result
}

/// MACD line, signal line and histogram, all aligned to the input length.
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> MacdResult {
    if fast == 0 || slow == 0 || signal == 0 || data.is_empty() {
        return MacdResult {
            macd_line: vec![],
            signal_line: vec![],
            histogram: vec![],
        };
    }

    let ema_fast = ema(data, fast);
    let ema_slow = ema(data, slow);

    // Both EMAs are full length, so the three series stay aligned.
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal);
    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands: SMA middle with a sample-standard-deviation envelope
/// computed over exactly the SMA window.
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_mult: f64) -> BollingerBands {
    if period < 2 || data.len() < period {
        return BollingerBands {
            upper: vec![],
            middle: vec![],
            lower: vec![],
        };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for i in period - 1..data.len() {
        let window = &data[i + 1 - period..=i];
        let mean = middle[i + 1 - period];
        let variance: f64 =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        let width = std_mult * variance.sqrt();

        upper.push(mean + width);
        lower.push(mean - width);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// Stochastic oscillator %K/%D over separate high/low/close series.
pub struct StochasticResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticResult {
    if k_period == 0
        || close.len() < k_period
        || high.len() != close.len()
        || low.len() != close.len()
    {
        return StochasticResult { k: vec![], d: vec![] };
    }

    let mut k_values = Vec::with_capacity(close.len() - k_period + 1);
    for i in k_period - 1..close.len() {
        let highest = high[i + 1 - k_period..=i]
            .iter()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let lowest = low[i + 1 - k_period..=i]
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b));

        // Flat window: %K is undefined, use the midpoint.
        let k = if highest == lowest {
            50.0
        } else {
            100.0 * (close[i] - lowest) / (highest - lowest)
        };
        k_values.push(k);
    }

    let d_values = sma(&k_values, d_period);

    StochasticResult {
        k: k_values,
        d: d_values,
    }
}

/// Classic pivot-point support/resistance levels over the trailing
/// `lookback` window (H = window high, L = window low, C = latest close).
pub fn pivot_points(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    lookback: usize,
) -> Option<PivotPoints> {
    if lookback == 0
        || close.is_empty()
        || high.len() != close.len()
        || low.len() != close.len()
    {
        return None;
    }

    let start = close.len().saturating_sub(lookback);
    let h = high[start..]
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let l = low[start..].iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let c = *close.last()?;

    let pivot = (h + l + c) / 3.0;
    Some(PivotPoints {
        pivot,
        r1: 2.0 * pivot - l,
        r2: pivot + (h - l),
        s1: 2.0 * pivot - h,
        s2: pivot - (h - l),
    })
}

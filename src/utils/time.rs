/// Fuente de tiempo de pared (ms desde epoch)
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Reloj real. En el navegador chrono usa Date.now() (feature wasmbind)
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

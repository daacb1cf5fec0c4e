extern crate anyhow;
extern crate image;
extern crate rppal;
extern crate std;

pub type MetroResult<T> = anyhow::Result<T>;

pub fn make_error(msg: &str) -> anyhow::Error {
    return anyhow::anyhow!(msg.to_string());
}

// Failures of the physical panel (or whatever stands in for it). These are
// the only errors that escape a render; data problems are defaulted away.
#[derive(Debug)]
pub enum PanelError {
    GpioError(rppal::gpio::Error),
    SpiError(rppal::spi::Error),
    BusyTimeout(std::time::Duration),
    ShortWrite { expected: usize, written: usize },
    ImageError(image::ImageError),
    Rejected(String),
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PanelError::GpioError(ref err) => {
                return write!(f, "GPIO Error: {}", err);
            },
            PanelError::SpiError(ref err) => {
                return write!(f, "SPI Error: {}", err);
            },
            PanelError::BusyTimeout(ref waited) => {
                return write!(f, "Panel still busy after {:?}", waited);
            },
            PanelError::ShortWrite { expected, written } => {
                return write!(f, "SPI short write: {} of {} bytes", written, expected);
            },
            PanelError::ImageError(ref err) => {
                return write!(f, "Image Error: {}", err);
            },
            PanelError::Rejected(ref msg) => {
                return write!(f, "Panel rejected commit: {}", msg);
            },
        }
    }
}

impl std::error::Error for PanelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            PanelError::GpioError(ref err) => Some(err),
            PanelError::SpiError(ref err) => Some(err),
            PanelError::ImageError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<rppal::gpio::Error> for PanelError {
    fn from(err: rppal::gpio::Error) -> PanelError {
        return PanelError::GpioError(err);
    }
}

impl From<rppal::spi::Error> for PanelError {
    fn from(err: rppal::spi::Error) -> PanelError {
        return PanelError::SpiError(err);
    }
}

impl From<image::ImageError> for PanelError {
    fn from(err: image::ImageError) -> PanelError {
        return PanelError::ImageError(err);
    }
}

#[cfg(test)]
mod tests {
    use super::PanelError;

    #[test]
    fn panel_error_survives_anyhow() {
        let err: anyhow::Error = PanelError::BusyTimeout(std::time::Duration::from_secs(3)).into();

        match err.downcast_ref::<PanelError>() {
            Some(PanelError::BusyTimeout(waited)) => assert_eq!(3, waited.as_secs()),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!("Panel still busy after 3s", format!("{}", err));
    }

    #[test]
    fn make_error_keeps_message() {
        assert_eq!("no fonts", format!("{}", super::make_error("no fonts")));
    }
}

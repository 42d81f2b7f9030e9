use crate::model::WindowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BorderError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка отслеживания файла: {0}")]
    Watch(#[from] notify::Error),

    /// Некорректное правило; возникает только при загрузке конфигурации
    #[error("Некорректное правило: {0}")]
    Validation(String),

    /// Перечисление окон не удалось целиком, цикл пропускается
    #[error("Не удалось получить список окон: {0}")]
    Snapshot(String),

    /// Вызов установки рамки не удался для одного окна
    #[error("Не удалось применить цвет к окну {window}: {reason}")]
    Apply { window: WindowId, reason: String },

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

impl BorderError {
    pub fn apply(window: WindowId, reason: impl Into<String>) -> Self {
        BorderError::Apply {
            window,
            reason: reason.into(),
        }
    }

    /// Ошибка касается одного окна и не должна прерывать цикл
    pub fn is_transient(&self) -> bool {
        matches!(self, BorderError::Apply { .. })
    }
}

pub type Result<T> = std::result::Result<T, BorderError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! border_error {
    (validation, $($arg:tt)*) => {
        $crate::error::BorderError::Validation(format!($($arg)*))
    };
    (snapshot, $($arg:tt)*) => {
        $crate::error::BorderError::Snapshot(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::BorderError::ServiceUnavailable(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_apply_errors_are_transient() {
        assert!(BorderError::apply(WindowId(7), "окно закрыто").is_transient());
        assert!(!border_error!(snapshot, "EnumWindows вернул {}", 0).is_transient());
        assert!(!border_error!(validation, "правило #{}", 2).is_transient());
    }

    #[test]
    fn test_apply_error_message_names_window() {
        let err = BorderError::apply(WindowId(0x1a2b), "нет доступа");
        let text = err.to_string();
        assert!(text.contains("0x1a2b"));
        assert!(text.contains("нет доступа"));
    }
}

//! User-facing texts. The relay talks to its users in Russian.

use crate::llm::FailureKind;

pub const CLI_BANNER: &str = "--- Чат с ассистентом ---";
pub const CLI_HINT: &str = "Введите 'выход' или 'exit', чтобы завершить программу.";
pub const CLI_PROMPT: &str = "Вы: ";
pub const CLI_ASSISTANT_PREFIX: &str = "Ассистент: ";
pub const CLI_CLOSING: &str = "Завершение чата...";
pub const CLI_FINISHED: &str = "Программа завершена.";

pub const BOT_RESET_DONE: &str = "История диалога сброшена. Можете начать заново.";

/// Tokens that end the interactive chat, compared case-insensitively.
pub const EXIT_TOKENS: [&str; 3] = ["выход", "exit", "quit"];

pub fn is_exit_token(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_TOKENS.iter().any(|token| *token == normalized)
}

pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RateLimited =>
            "Извините, сейчас слишком много запросов к сервису ИИ. Попробуйте чуть позже.",
        FailureKind::AuthFailed =>
            "Произошла ошибка с подключением к сервису ИИ (Auth). Пожалуйста, сообщите администратору.",
        FailureKind::ApiError =>
            "Извините, произошла ошибка при обращении к сервису ИИ. Попробуйте еще раз.",
        FailureKind::UnknownError => "Произошла внутренняя ошибка. Попробуйте позже.",
    }
}

/// Terminal variant of [`failure_message`]; the person at the terminal runs the relay.
pub fn cli_failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RateLimited =>
            "Ошибка: Вы превысили лимит запросов к API. Попробуйте позже или проверьте ваш тарифный план.",
        FailureKind::AuthFailed => "Ошибка аутентификации: Неверный ключ API. Проверьте ключ.",
        FailureKind::ApiError => "Ошибка API сервиса ИИ. Попробуйте еще раз.",
        FailureKind::UnknownError => "Произошла непредвиденная ошибка. Подробности в журнале.",
    }
}

/// Default `/start` text; `{mention}` is replaced with an HTML link to the user.
pub const BOT_GREETING_TEMPLATE: &str =
    "Привет, {mention}! 👋\n\n\
Я ИИ-ассистент компании ИИ Лаборатория. Просто отправь мне сообщение, и я постараюсь ответить.\n\n\
История диалога сохраняется в рамках сессии (до перезапуска бота).\n\
Чтобы начать заново, используй команду /reset.";

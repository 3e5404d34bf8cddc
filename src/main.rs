use error_reporter::Report;

mod app;
mod cli;
mod console;
mod logging;
mod picker;
mod portal;
mod session;

rust_i18n::i18n!();

fn main() {
    logging::init();
    init_i18n();
    cli::main();
}

fn init_i18n() {
    let current = match current_locale::current_locale() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Could not retrieve current locale: {}", Report::new(e));
            return;
        }
    };
    let tags = match language_tags::LanguageTag::parse(&current) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("Could not parse locale `{current}`: {}", Report::new(e));
            return;
        }
    };
    let language = tags.primary_language();
    if !rust_i18n::available_locales!().contains(&language) {
        log::debug!("No translations for `{language}`, using English");
        return;
    }
    rust_i18n::set_locale(language);
}

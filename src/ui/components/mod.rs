mod input;
mod key_result;
mod overlay;
mod record_form;
mod search_input;

pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use overlay::draw_prompt_overlay;
pub use record_form::{FormEvent, FormValues, RecordForm};
pub use search_input::{SearchEvent, SearchInput};

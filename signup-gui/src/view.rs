use iced::{
    widget::{button, container, scrollable, text, text_input, Column},
    Element, Length,
};

use signup::{
    config::FormVariant,
    form::Field,
    state::{Msg, Outcome, State, Submission},
};

fn field_view(state: &State, field: Field) -> Element<'_, Msg> {
    let input = text_input(field.label(), state.fields.get(field))
        .on_input(move |value| Msg::UpdateField(field, value))
        .secure(field.is_secret())
        .padding(10);
    let input = if state.can_submit() {
        input.on_submit(Msg::Submit)
    } else {
        input
    };

    Column::new()
        .push(text(field.label()).size(14))
        .push(input)
        .push_maybe(
            state
                .errors
                .get(field)
                .map(|e| text(e).size(14).style(text::danger)),
        )
        .spacing(4)
        .into()
}

fn products_view(state: &State) -> Element<'_, Msg> {
    state
        .products
        .iter()
        .fold(
            Column::new().push(text("Products").size(18)).spacing(8),
            |col, product| col.push(text(product.title.as_str())),
        )
        .push(
            button(text("Logout"))
                .style(button::secondary)
                .on_press(Msg::Logout),
        )
        .into()
}

pub fn form_view(state: &State) -> Element<'_, Msg> {
    let pending = state.submission.is_pending();
    let submitted_locally = state.variant == FormVariant::Local
        && state.submission == Submission::Settled(Outcome::Succeeded);

    let form = state
        .mode
        .fields()
        .fold(
            Column::new().push(text(state.mode.title()).size(24)).spacing(16),
            |col, field| col.push(field_view(state, field)),
        )
        .push_maybe(
            state
                .errors
                .submit()
                .map(|e| text(e).size(14).style(text::danger)),
        )
        .push_maybe(submitted_locally.then(|| text("Form submitted").style(text::success)))
        .push(
            button(text(if pending {
                "Submitting..."
            } else {
                state.mode.title()
            }))
            .width(Length::Fill)
            .padding(10)
            .on_press_maybe((!pending).then_some(Msg::Submit)),
        )
        .push_maybe(pending.then(|| {
            button(text("Cancel"))
                .width(Length::Fill)
                .padding(10)
                .style(button::secondary)
                .on_press(Msg::CancelSubmit)
        }))
        .push_maybe(state.can_toggle_mode().then(|| {
            button(text(state.mode.toggle_label()))
                .width(Length::Fill)
                .padding(10)
                .style(button::secondary)
                .on_press(Msg::ToggleMode)
        }))
        .push_maybe(state.session.as_ref().map(|_| products_view(state)));

    scrollable(
        container(container(form).max_width(420).padding(20))
            .center_x(Length::Fill)
            .padding(20),
    )
    .into()
}

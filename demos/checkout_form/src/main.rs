use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use repose_core::Scheduler;
use repose_form::*;

/// Pretend backend: each submission waits for a reply the script sends later.
#[derive(Clone, Default)]
struct Backend {
    replies: Rc<RefCell<Vec<oneshot::Sender<bool>>>>,
}

impl Backend {
    fn request(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push(tx);
        rx
    }

    fn reply(&self, accepted: bool) {
        if let Some(tx) = self.replies.borrow_mut().pop() {
            let _ = tx.send(accepted);
        }
    }
}

fn validate(values: &FormValues) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if values.value("name").is_blank() {
        errors.insert("name", "Please enter your name.");
    }
    if !values
        .value("email")
        .as_str()
        .is_some_and(|email| email.contains('@'))
    {
        errors.insert("email", "Please enter a valid email address.");
    }
    if values.value("terms").as_bool() != Some(true) {
        errors.insert("terms", "You must accept the terms.");
    }
    errors
}

fn render(ctx: &FormContext) {
    let a = &ctx.adapter;
    let button = if a.is_submitting {
        "[ saving… ]"
    } else if a.is_submitted {
        "[ saved ]"
    } else {
        "[ save ]"
    };
    println!(
        "render: name={:?} email={:?} terms={} {button} submitter={}",
        ctx.values.value("name").to_string(),
        ctx.values.value("email").to_string(),
        ctx.values.value("terms"),
        a.submitter.as_ref().map_or("-", |s| s.id()),
    );
    if a.requested_show_validation() {
        for (field, message) in ctx.errors.iter() {
            println!("        ! {field}: {message}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let scheduler = Scheduler::new();
    let backend = Backend::default();

    let api = backend.clone();
    let form = AdaptiveForm::new()
        .initial_values([
            ("name", FieldValue::from("")),
            ("email", FieldValue::from("")),
            ("terms", FieldValue::from(false)),
        ])
        .validate(validate)
        .on_change(|change, _values, is_valid| {
            println!(
                "change: {} = {:?} (form valid: {is_valid})",
                change.name,
                change.value.to_string()
            );
        })
        .on_submit(move |values, enhancer| {
            let reply = api.request();
            async move {
                println!(
                    "submit: attempt {} from {:?} with {} field(s)",
                    enhancer.attempt(),
                    enhancer.submitter().map(Submitter::id),
                    values.len()
                );
                let accepted = reply.await?;
                if !accepted {
                    enhancer.signal_failed_submission();
                }
                Ok(())
            }
        })
        .mount(&scheduler, render);

    println!("-- submit an empty form");
    scheduler.dispatch(|| {
        form.show_validation();
        form.handle_submit("save");
    })?;

    println!("-- autofill three fields in one handler");
    scheduler.dispatch(|| {
        form.set_value("name", "Ada Lovelace");
        form.set_value("email", "ada@example.com");
        form.get_input_props("terms").toggle();
        form.hide_validation();
    })?;

    println!("-- submit, server rejects");
    scheduler.dispatch(|| form.handle_submit("save"))?;
    backend.reply(false);
    scheduler.flush()?;

    println!("-- submit again from the other button, server accepts");
    scheduler.dispatch(|| form.handle_submit("save-and-continue"))?;
    backend.reply(true);
    scheduler.flush()?;

    let state = form.adapter();
    log::info!("final adapter state: {state:?}");
    form.unmount();
    Ok(())
}

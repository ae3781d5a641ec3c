use std::cell::RefCell;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;

use ec450_meter::{Meter, Publication};
use ec450_transport::{RxBuffer, StreamSource};

use crate::config::MeterConfig;
use crate::exit::{bind_error, transport_error, CliResult};

/// Values published by bound sinks, drained after every tick.
pub type Published = Rc<RefCell<Vec<Publication>>>;

/// Open `path` and build a meter with a recording sink on every configured channel.
pub fn open_meter(
    path: &Path,
    config: &MeterConfig,
    chunk_size: usize,
) -> CliResult<(Meter<StreamSource<File>>, Published)> {
    let source = StreamSource::open(path, RxBuffer::with_capacity(config.rx_buffer_size), chunk_size)
        .map_err(|err| transport_error("open failed", err))?;
    let mut meter = Meter::with_config(source, config.frame_config());

    let published: Published = Rc::new(RefCell::new(Vec::new()));
    let channels = config
        .sensors
        .channels()
        .map_err(|err| bind_error("invalid sensors", err))?;
    for channel in channels {
        let published = Rc::clone(&published);
        meter.sinks_mut().bind(channel, move |value: f32| {
            published.borrow_mut().push(Publication { channel, value });
        });
    }

    Ok((meter, published))
}

pub fn drain(published: &Published) -> Vec<Publication> {
    std::mem::take(&mut *published.borrow_mut())
}

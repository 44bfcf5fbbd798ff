use std::convert::Infallible;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use iced::subscription::{self, Subscription};
use futures::{StreamExt, SinkExt};
use futures::channel::mpsc::{channel, Sender};
use futures::executor::block_on;
use futures::future::{select, Either};
use log::{debug, info, warn};
use serialport::SerialPort;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tokio::time::{sleep, Duration};

use crate::device::constants::{READ_BUFFER_SIZE, READ_TIMEOUT, SPP_UUID, WRITE_DEADLINE};
use crate::device::line_buffer::LineBuffer;
use crate::device::protocol::{parse_reply, Command, Reply};
use crate::device::scan::list_paired_devices;
use crate::device::types::{DeviceCommand, DeviceEvent, DeviceState, PairedDevice};
use crate::error::DeviceError;

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    Reply(Reply),
    Closed(String),
}

/// Events of one reader thread. `generation` tells replies of a previous connection apart.
#[derive(Debug)]
struct TaggedReaderEvent {
    generation: u64,
    event: ReaderEvent,
}

struct Connection {
    device: PairedDevice,
    generation: u64,
    writer: SharedPort,
    cancel: CancellationToken,
    reader_handle: Option<thread::JoinHandle<()>>,
}

fn is_retryable(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

/// Blocking read loop: split the input into lines, parse them and hand the replies to `emit`.
///
/// Returns when `cancel` is cancelled, when `emit` returns false, or after the first read error
/// (reported as [`ReaderEvent::Closed`]). Read timeouts are not errors.
pub fn read_lines<R: Read>(mut reader: R, cancel: &CancellationToken, mut emit: impl FnMut(ReaderEvent) -> bool) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut lines = LineBuffer::new();

    while !cancel.is_cancelled() {
        let count = match reader.read(&mut buffer) {
            Ok(0) => {
                info!("Device closed the connection");
                emit(ReaderEvent::Closed("end of stream".to_string()));
                return;
            },
            Ok(count) => count,
            Err(err) if is_retryable(&err) => continue,
            Err(err) => {
                warn!("Failed to read from device: {}", err);
                emit(ReaderEvent::Closed(err.to_string()));
                return;
            },
        };

        for line in lines.push(&buffer[..count]) {
            debug!("Received from device: {}", line);

            match parse_reply(&line) {
                Ok(Reply::Unrecognized(line)) => {
                    debug!("Unrecognized reply from device: {}", line);
                },
                Ok(reply) => {
                    if !emit(ReaderEvent::Reply(reply)) {
                        return;
                    }
                },
                Err(err) => warn!("Dropping malformed reply: {}", err),
            }
        }
    }

    debug!("Reader cancelled");
}

/// Write one command followed by a newline.
pub fn write_line<W: Write + ?Sized>(writer: &mut W, command: &Command) -> Result<(), DeviceError> {
    writer.write_all(command.encode().as_bytes())?;
    writer.flush()?;
    Ok(())
}

async fn write_command(writer: &SharedPort, command: Command) -> Result<(), DeviceError> {
    let writer = writer.clone();
    let fut = spawn_blocking(move || {
        let mut port = match writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        write_line(&mut **port, &command)
    });

    tokio::select! {
        _ = sleep(Duration::from_millis(WRITE_DEADLINE)) => {
            warn!("Writing to the device took too long");
            Err(DeviceError::WriteTimeout)
        }
        result = fut => result?,
    }
}

fn open_port(device: &PairedDevice, baud_rate: u32) -> Result<Box<dyn SerialPort>, DeviceError> {
    info!("Opening {} ({}) for SPP service {}", device.port_name, device.name, SPP_UUID);
    let port = serialport::new(device.port_name.as_str(), baud_rate)
        .timeout(std::time::Duration::from_millis(READ_TIMEOUT))
        .open()?;
    Ok(port)
}

/// Blocks until `item` is queued. Gives up (false) when `cancel` fires first, so a full channel
/// that nobody drains anymore cannot keep the reader thread alive.
fn send_or_cancel<T>(sender: &mut Sender<T>, item: T, cancel: &CancellationToken) -> bool {
    block_on(async {
        let send = sender.send(item);
        let cancelled = cancel.cancelled();
        futures::pin_mut!(send, cancelled);

        match select(send, cancelled).await {
            Either::Left((result, _)) => result.is_ok(),
            Either::Right(_) => false,
        }
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    port: R,
    generation: u64,
    cancel: CancellationToken,
    mut sender: Sender<TaggedReaderEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("device-reader-{}", generation))
        .spawn(move || {
            read_lines(port, &cancel, |event| {
                send_or_cancel(&mut sender, TaggedReaderEvent { generation, event }, &cancel)
            });
        })
}

async fn connect(
    device: PairedDevice,
    baud_rate: u32,
    generation: u64,
    cancel: &CancellationToken,
    reader_sender: Sender<TaggedReaderEvent>,
) -> Result<Connection, DeviceError> {
    let device_clone = device.clone();
    let port = spawn_blocking(move || open_port(&device_clone, baud_rate)).await??;
    let reader = port.try_clone()?;

    let connection_cancel = cancel.child_token();
    let reader_handle = spawn_reader(reader, generation, connection_cancel.clone(), reader_sender)?;

    Ok(Connection {
        device,
        generation,
        writer: Arc::new(Mutex::new(port)),
        cancel: connection_cancel,
        reader_handle: Some(reader_handle),
    })
}

async fn close(connection: &mut Option<Connection>) {
    if let Some(mut connection) = connection.take() {
        info!("Closing connection to {}", connection.device.port_name);
        connection.cancel.cancel();

        if let Some(handle) = connection.reader_handle.take() {
            info!("Waiting for reader thread to stop");
            match spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => info!("Reader thread stopped"),
                Ok(Err(_)) => warn!("Reader thread panicked"),
                Err(err) => warn!("Failed to join reader thread: {}", err),
            }
        }
    }
}

async fn emit(output: &mut Sender<DeviceEvent>, event: DeviceEvent) {
    if let Err(err) = output.send(event).await {
        warn!("Failed to deliver device event: {}", err);
    }
}

async fn send_command(output: &mut Sender<DeviceEvent>, connection: &Option<Connection>, command: Command) {
    let result = match connection {
        Some(connection) => write_command(&connection.writer, command).await,
        None => Err(DeviceError::NotConnected),
    };

    match result {
        Ok(()) => {
            debug!("Sent to device: {}", command);
            emit(output, DeviceEvent::Sent(command)).await;
        },
        Err(err) => {
            warn!("Failed to send {} to device: {}", command, err);
            emit(output, DeviceEvent::WriteFailed(err.to_string())).await;
        },
    }
}

async fn connect_device(cancel: CancellationToken, mut output: Sender<DeviceEvent>) -> Infallible {
    let (command_sender, mut command_receiver) = channel::<DeviceCommand>(32);
    let (reader_sender, mut reader_receiver) = channel::<TaggedReaderEvent>(128);
    let mut connection: Option<Connection> = None;
    let mut generation: u64 = 0;

    emit(&mut output, DeviceEvent::Ready(command_sender)).await;

    // note: subscription::channel expects the future to never resolve (Infallible)
    // so this loop is not stopped if `cancel` is cancelled, only the connection is closed.
    loop {
        tokio::select! {
            _ = cancel.cancelled(), if connection.is_some() => {
                close(&mut connection).await;
            },
            Some(command) = command_receiver.next() => match command {
                DeviceCommand::Scan { show_all_ports } => {
                    let event = match spawn_blocking(move || list_paired_devices(show_all_ports)).await {
                        Ok(Ok(devices)) => DeviceEvent::Scanned(devices),
                        Ok(Err(err)) => {
                            warn!("Listing devices failed: {}", err);
                            DeviceEvent::ScanFailed(err.to_string())
                        },
                        Err(err) => DeviceEvent::ScanFailed(err.to_string()),
                    };
                    emit(&mut output, event).await;
                },
                DeviceCommand::Connect { device, baud_rate } => {
                    close(&mut connection).await;
                    emit(&mut output, DeviceEvent::StateChange(DeviceState::Connecting(device.clone()))).await;

                    generation += 1;
                    match connect(device.clone(), baud_rate, generation, &cancel, reader_sender.clone()).await {
                        Ok(new_connection) => {
                            info!("Connected to {}", new_connection.device.port_name);
                            connection = Some(new_connection);
                            emit(&mut output, DeviceEvent::StateChange(DeviceState::Connected(device))).await;
                            send_command(&mut output, &connection, Command::GetRadius).await;
                        },
                        Err(err) => {
                            warn!("Connecting to {} failed: {}", device.port_name, err);
                            emit(&mut output, DeviceEvent::StateChange(DeviceState::Failed(err.to_string()))).await;
                        },
                    }
                },
                DeviceCommand::Send(command) => {
                    send_command(&mut output, &connection, command).await;
                },
                DeviceCommand::Disconnect => {
                    close(&mut connection).await;
                    emit(&mut output, DeviceEvent::StateChange(DeviceState::Disconnected)).await;
                },
            },
            Some(TaggedReaderEvent { generation: event_generation, event }) = reader_receiver.next() => {
                let current = connection.as_ref().map(|c| c.generation);
                if current != Some(event_generation) {
                    debug!("Ignoring event of a previous connection: {:?}", event);
                    continue;
                }

                match event {
                    ReaderEvent::Reply(reply) => {
                        emit(&mut output, DeviceEvent::Reply(reply)).await;
                    },
                    ReaderEvent::Closed(reason) => {
                        warn!("Connection lost: {}", reason);
                        close(&mut connection).await;
                        emit(&mut output, DeviceEvent::StateChange(DeviceState::Lost)).await;
                    },
                }
            },
            else => {
                // every sender is gone; nothing left to do
                futures::future::pending::<()>().await;
            },
        }
    }
}

pub fn connect_device_subscription(cancel: CancellationToken) -> Subscription<DeviceEvent> {
    struct Connect;

    subscription::channel(
        std::any::TypeId::of::<Connect>(),
        64,
        move |subscription_sender| {
            let cancel2 = cancel.clone();

            async move {
                connect_device(cancel2, subscription_sender).await
            }
        },
    )
}

//! Native patch text to [`Patch`].
//!
//! Parsing runs in two passes. Pass 1 walks the statements in file order and
//! feeds every node, canvas and restore to the [`PatchBuilder`], while
//! `#X connect` lines are only recorded against the canvas they appear in.
//! Pass 2 resolves those edges once every node index is known.

mod words;

use patchbay_syntax::{Binbuf, Word, split};

use crate::atom::Atom;
use crate::error::{PatchError, Result};
use crate::geometry::{Area, Coords, Point, Size};
use crate::model::{
    ArrayDefine, AtomBox, AtomKind, CanvasHeader, CanvasId, Comment, DeclareEntry, DeclareFlag,
    Declaration, Edge, GopArray, Gui, Message, Object, Patch, PatchBuilder, Restore, Scalar,
    Struct, is_iem_class,
};
use crate::settings::Settings;

use words::{Body, index, number};

/// A connect statement waiting for pass 2.
#[derive(Debug)]
struct PendingEdge {
    statement: usize,
    canvas: CanvasId,
    edge: Edge,
}

pub struct Parser<'s> {
    settings: &'s Settings,
}

/// Parse native text into an untitled patch.
pub fn parse(source: &str, settings: &Settings) -> Result<Patch> {
    Parser::new(settings).parse("untitled", source)
}

impl<'s> Parser<'s> {
    pub fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    pub fn parse(&self, name: &str, source: &str) -> Result<Patch> {
        let mut builder = PatchBuilder::new(name, self.settings);
        let mut pending = Vec::new();
        let mut statements = 0;

        for binbuf in split(source) {
            let binbuf = binbuf?;
            log::trace!(
                "statement {} (line {}): {:?}",
                binbuf.index,
                binbuf.line,
                binbuf.keyword()
            );
            self.statement(&mut builder, &binbuf, &mut pending)
                .map_err(|error| error.at_statement(binbuf.index))?;
            statements += 1;
        }

        let edges = pending.len();
        for PendingEdge {
            statement,
            canvas,
            edge,
        } in pending
        {
            builder
                .connect_in(canvas, edge)
                .map_err(|error| error.at_statement(statement))?;
        }

        log::debug!("parsed `{name}`: {statements} statements, {edges} edges");
        builder.finish()
    }

    fn statement(
        &self,
        builder: &mut PatchBuilder<'_>,
        binbuf: &Binbuf,
        pending: &mut Vec<PendingEdge>,
    ) -> Result<()> {
        match binbuf.keyword() {
            (Some("#N"), Some("canvas")) => self.canvas(builder, &Body::of(binbuf)?),
            (Some("#N"), Some("struct")) => {
                builder.add_struct(Struct::from_words(&Body::of(binbuf)?.words)?)
            }
            (Some("#A"), _) => builder.attach_data(
                binbuf.words[1..]
                    .iter()
                    .map(|word| match word {
                        Word::Text(text) => Atom::parse(text),
                        Word::Comma => Atom::symbol(","),
                    })
                    .collect(),
            ),
            (Some("#X"), Some(keyword)) => {
                let body = Body::of(binbuf)?;
                match keyword {
                    "obj" => self.object(builder, &body),
                    "msg" => {
                        let (position, rest) = body.position()?;
                        builder.add_message(Message::from_words(rest.iter().copied()), Some(position))?;
                        apply_width(builder, &body)
                    }
                    "text" => {
                        let (position, rest) = body.position()?;
                        let comment = Comment {
                            position,
                            words: rest.iter().map(|w| w.to_string()).collect(),
                            width: None,
                        };
                        builder.add_comment(comment, Some(position))?;
                        apply_width(builder, &body)
                    }
                    "floatatom" | "symbolatom" | "listbox" => {
                        let kind = AtomKind::from_keyword(keyword).ok_or_else(|| {
                            PatchError::argument(format!("`{keyword}` is not an atom box"))
                        })?;
                        let (position, rest) = body.position()?;
                        builder.add_atom_box(AtomBox::from_words(kind, position, rest)?, Some(position))?;
                        apply_width(builder, &body)
                    }
                    "connect" => {
                        let canvas = builder
                            .current_canvas()
                            .ok_or_else(|| PatchError::argument("connect outside any canvas"))?;
                        pending.push(PendingEdge {
                            statement: binbuf.index,
                            canvas,
                            edge: connection(&body.words)?,
                        });
                        Ok(())
                    }
                    "restore" => {
                        let (position, rest) = body.position()?;
                        let (class_name, args) = match rest.split_first() {
                            Some((class_name, args)) => (class_name.to_string(), atoms(args)),
                            None => (String::new(), Vec::new()),
                        };
                        builder.restore(Restore {
                            position: Some(position),
                            class_name,
                            args,
                            width: body.width,
                        })?;
                        Ok(())
                    }
                    "coords" => builder.set_coords(coords(&body.words)?),
                    "array" => {
                        builder.add_gop_array(GopArray::from_words(&body.words)?)?;
                        Ok(())
                    }
                    "scalar" => {
                        let (template, values) = body
                            .words
                            .split_first()
                            .ok_or_else(|| PatchError::argument("scalar without a template"))?;
                        let scalar = Scalar::from_words(template, values, builder.structs())?;
                        builder.add_scalar(scalar)?;
                        Ok(())
                    }
                    "declare" => {
                        builder.add_declaration(declaration(&body.words)?);
                        Ok(())
                    }
                    "f" => match body.words.as_slice() {
                        [width] => builder.set_width(number(width, "box width")?),
                        _ => Err(PatchError::argument("`#X f` takes exactly one width")),
                    },
                    _ => Err(unrecognized(binbuf)),
                }
            }
            _ => Err(unrecognized(binbuf)),
        }
    }

    fn canvas(&self, builder: &mut PatchBuilder<'_>, body: &Body<'_>) -> Result<()> {
        let (header, rect) = match body.words.as_slice() {
            [x, y, w, h, font] => (
                CanvasHeader::Root {
                    font: number(font, "font size")?,
                },
                [x, y, w, h],
            ),
            [x, y, w, h, title, visible] => (
                CanvasHeader::Subpatch {
                    title: title.to_string(),
                    visible: number(visible, "visibility flag")? != 0.0,
                },
                [x, y, w, h],
            ),
            other => {
                return Err(PatchError::argument(format!(
                    "canvas header takes 5 or 6 fields, found {}",
                    other.len()
                )));
            }
        };
        let [x, y, w, h] = rect;
        builder.open_canvas(
            header,
            Some(Point::new(number(x, "screen x")?, number(y, "screen y")?)),
            Some(Size::new(number(w, "width")?, number(h, "height")?)),
        )?;
        Ok(())
    }

    fn object(&self, builder: &mut PatchBuilder<'_>, body: &Body<'_>) -> Result<()> {
        let (position, rest) = body.position()?;
        match rest.split_first() {
            None => {
                builder.add_object(Object::new("", Vec::new()), Some(position))?;
            }
            Some((class_name, args)) if is_iem_class(class_name) => {
                let gui = Gui::from_words(class_name, position, args, self.settings)?;
                builder.add_gui(gui, Some(position))?;
            }
            Some((class_name, args)) if ArrayDefine::is_define(class_name, args) => {
                let array = ArrayDefine::from_words(class_name, position, args)?;
                builder.add_array(array, Some(position))?;
            }
            Some((class_name, args)) => {
                builder.add_object(Object::new(*class_name, atoms(args)), Some(position))?;
            }
        }
        apply_width(builder, body)
    }
}

fn apply_width(builder: &mut PatchBuilder<'_>, body: &Body<'_>) -> Result<()> {
    match body.width {
        Some(width) => builder.set_width(width),
        None => Ok(()),
    }
}

fn atoms(words: &[&str]) -> Vec<Atom> {
    words.iter().map(|word| Atom::parse(word)).collect()
}

fn connection(words: &[&str]) -> Result<Edge> {
    match words {
        [from, outlet, to, inlet] => Ok(Edge::new(
            index(from, "source index")?,
            index(outlet, "outlet")?,
            index(to, "sink index")?,
            index(inlet, "inlet")?,
        )),
        _ => Err(PatchError::argument(format!(
            "connect takes 4 fields, found {}",
            words.len()
        ))),
    }
}

fn coords(words: &[&str]) -> Result<Coords> {
    let values = words
        .iter()
        .map(|word| number(word, "coords"))
        .collect::<Result<Vec<_>>>()?;
    match values.as_slice() {
        [x1, y1, x2, y2, w, h, gop, margin @ ..] if margin.is_empty() || margin.len() == 2 => {
            Ok(Coords {
                range: Area::new(Point::new(*x1, *y1), Point::new(*x2, *y2)),
                size: Size::new(*w, *h),
                gop: *gop,
                margin: match margin {
                    [mx, my] => Some(Point::new(*mx, *my)),
                    _ => None,
                },
            })
        }
        _ => Err(PatchError::argument(format!(
            "coords takes 7 or 9 fields, found {}",
            values.len()
        ))),
    }
}

fn declaration(words: &[&str]) -> Result<Declaration> {
    if words.len() % 2 != 0 {
        return Err(PatchError::argument("declare flags come in pairs"));
    }
    let entries = words
        .chunks(2)
        .map(|pair| {
            let flag = DeclareFlag::parse(pair[0]).ok_or_else(|| {
                PatchError::argument(format!("unknown declare flag `{}`", pair[0]))
            })?;
            Ok(DeclareEntry {
                flag,
                value: pair[1].to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Declaration { entries })
}

fn unrecognized(binbuf: &Binbuf) -> PatchError {
    let keyword = [binbuf.text(0), binbuf.text(1)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    PatchError::UnrecognizedStatement {
        statement: binbuf.index,
        keyword,
    }
}

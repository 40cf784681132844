//! Embedded control page served at `/`.
//!
//! A joystick pad posts `{x, y}` to `/control`, the mode button posts the
//! line-following flag to `/mode` and the slider posts `{speed}` to `/speed`.

pub const HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Dual-Mode Bot</title>
<style>
body { font-family: sans-serif; text-align: center; margin: 0; padding: 16px; user-select: none; }
#pad { width: 280px; height: 280px; margin: 24px auto; border-radius: 50%; background: #e6e6e6; position: relative; touch-action: none; }
#knob { width: 90px; height: 90px; border-radius: 50%; background: #2e7d32; position: absolute; left: 95px; top: 95px; }
button { padding: 10px 18px; font-size: 16px; }
input[type=range] { width: 220px; }
</style>
</head>
<body>
<h1>Dual-Mode Bot</h1>
<p><button id="mode">Switch Mode</button></p>
<p id="label">Mode: Line Following</p>
<p><label for="speed">Speed</label>
<input type="range" id="speed" min="0" max="255" value="150"> <span id="speedValue">150</span></p>
<div id="pad"><div id="knob"></div></div>
<script>
const pad = document.getElementById('pad');
const knob = document.getElementById('knob');
const label = document.getElementById('label');
const speed = document.getElementById('speed');
const speedValue = document.getElementById('speedValue');
let lineFollow = true;
let dragging = false;

function post(path, body) {
  return fetch(path, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) });
}

function moveTo(e) {
  const r = pad.getBoundingClientRect();
  const reach = r.width / 2 - knob.offsetWidth / 2;
  let dx = e.clientX - r.left - r.width / 2;
  let dy = e.clientY - r.top - r.height / 2;
  const d = Math.hypot(dx, dy);
  if (d > reach) { dx *= reach / d; dy *= reach / d; }
  knob.style.transform = `translate(${dx}px, ${dy}px)`;
  if (!lineFollow) post('/control', { x: dx / reach * 100, y: -dy / reach * 100 });
}

pad.addEventListener('pointerdown', e => { dragging = true; pad.setPointerCapture(e.pointerId); moveTo(e); });
pad.addEventListener('pointermove', e => { if (dragging) moveTo(e); });
pad.addEventListener('pointerup', () => {
  dragging = false;
  knob.style.transform = 'translate(0px, 0px)';
  if (!lineFollow) post('/control', { x: 0, y: 0 });
});

document.getElementById('mode').addEventListener('click', () => {
  lineFollow = !lineFollow;
  label.textContent = 'Mode: ' + (lineFollow ? 'Line Following' : 'Remote Control');
  post('/mode', { mode: lineFollow });
});

speed.addEventListener('input', () => {
  speedValue.textContent = speed.value;
  post('/speed', { speed: parseInt(speed.value, 10) });
});
</script>
</body>
</html>
"#;
